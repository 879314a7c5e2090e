//! Prompt assembly for the ReAct loop
//!
//! Renders the tutor template with the tool listing, the recent history,
//! the question and the scratchpad of steps already taken this turn.

use crate::agent::loop_state::IntermediateStep;
use crate::core::{Message, ToolDescriptor};

/// Instructions and worked examples that teach the model the reasoning format
pub const TUTOR_TEMPLATE: &str = r#"
You are a math tutor who will use the tools available to answer math questions. You have access to the following tools:

{tools}

Check if the input question requires a tool use. When it comes to answering math related questions, you will always use the available tools to obtain the answer and not use your own knowledge.

If the input question is not about math or does not require a tool use, answer the question normally. Use the following format:

Question: the input question you must answer
Thought: This question is not about math or does not require a tool.
Final Answer:

If the input question is about math and requires a use of a tool to answer, use the following format:

Question: the input question you must answer
Thought: you should always think about what to do
Action: the action to take, should be one of [{tool_names}]
Action Input: the input to the action
Observation: the result of the action
... (this Thought/Action/Action Input/Observation can repeat N times)
Thought: I now know the final answer
Final Answer: the final answer to the original input question. Remember to explain how you got your final answer detailing your thought and observation for each step like a patient tutor explaining the concepts to a student.

Examples:

Question: what is 123 + 456 * 7?
Thought: This question requires performing math calculations, so I will use the calculator tool.
Action: Calculator
Action Input: 123 + 456 * 7
Observation: 3315
Thought: I now know the final answer
Final Answer: 123 + 456 * 7 = 3315. To solve this expression, we follow the order of operations. Multiplication is performed first before addition. We compute 456 * 7 and then add 123 to it to get 3315.

Question: What is the formula for calculating the circumference of a circle? Given a circle of radius 2 metres, what is the circumference of the circle?
Thought: This question requires a look up on the formula of the circumference of a circle and then to calculate the circumference of a circle of radius 2 metres. I will first need to look up on Wikipedia for the formula of the circumference of a circle.
Action: Wikipedia
Action Input: Circumference of a circle
Observation: The formula of the circumference of a circle is 2 * pi * radius.
Thought: I will use the formula of 2 * pi * radius to calculate the circumference of a circle of radius 2 metres. I will use the calculator tool.
Action: Calculator
Action Input: 2 * pi * 2
Observation: Approximately 12.566.
Thought: I now know the final answer
Final Answer: The circumference of a circle with radius 2 metres is approximately 12.566 metres. I found the formula of the circumference of a circle is 2 * pi * radius. For a circle of radius 2 metres, the circumference is calculated as 2 * pi * 2 = 12.566 metres.

Question: Is 11 a prime number?
Thought: This question requires checking if a number is prime. I will write a Python function to check if a number is prime and then use the Python tool to execute the code with the number 11 as the input.
Action: Python
Action Input:
```
def is_prime(n):
    if n <= 1:
        return False
    for i in range(2, int(n**0.5) + 1):
        if n % i == 0:
            return False
    return True

is_prime(11)
```
Observation: True
Thought: I now know the final answer
Final Answer: To check if a number is prime, we can write a Python function that checks if the number is divisible by any number from 2 to the square root of the number. If it is divisible by any number, then it is not prime. Otherwise, it is prime.
Using the Python tool, I executed `is_prime(11)` and observed that it returned `True`.
Therefore, 11 is a prime number.

Question: If Mary has four apples and Giorgio brings two and a half apple boxes (apple box contains eight apples), how many apples are there in total?
Thought: This question requires performing calculations to determine the total number of apples. I will use the calculator tool to perform the necessary calculations.
Action: Calculator
Action Input: 4 + 2.5 * 8
Observation: 24
Thought: I now know the final answer
Final Answer: To determine the total number of apples, we first calculate the number of apples in the boxes Giorgio brings. Each apple box contains eight apples and Giorgio brings two and a half boxes, so that is 2.5 * 8 = 20 apples.
Next, we add the four apples Mary has to the 20 apples in the boxes.
Therefore, the total number of apples is 24.

Begin!

Conversation history:
{history}

New question: {input}
{agent_scratchpad}"#;

/// Builds the text sent to the model for each call within a turn
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    template: String,
    tools: Vec<ToolDescriptor>,
}

impl PromptAssembler {
    /// Assembler over the built-in tutor template
    pub fn new(tools: Vec<ToolDescriptor>) -> Self {
        Self::with_template(TUTOR_TEMPLATE, tools)
    }

    /// Assembler over a custom template using the same placeholders
    pub fn with_template(template: impl Into<String>, tools: Vec<ToolDescriptor>) -> Self {
        Self {
            template: template.into(),
            tools,
        }
    }

    /// Tools listed in the prompt, in order
    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    /// Render the prompt for one model call
    pub fn assemble(
        &self,
        history: &[Message],
        question: &str,
        steps: &[IntermediateStep],
    ) -> String {
        assemble(&self.template, &self.tools, history, question, steps)
    }
}

/// Render `template` for one model call.
///
/// Output depends on the arguments only.
pub fn assemble(
    template: &str,
    tools: &[ToolDescriptor],
    history: &[Message],
    question: &str,
    steps: &[IntermediateStep],
) -> String {
    let tool_list = render_tools(tools);
    let tool_names = render_tool_names(tools);
    let history = render_history(history);
    let scratchpad = render_scratchpad(steps);

    substitute(
        template,
        &[
            ("tools", &tool_list),
            ("tool_names", &tool_names),
            ("history", &history),
            ("input", question),
            ("agent_scratchpad", &scratchpad),
        ],
    )
}

/// One `name: description` line per tool
pub fn render_tools(tools: &[ToolDescriptor]) -> String {
    tools
        .iter()
        .map(|t| format!("{}: {}", t.name, t.description))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Comma separated tool names
pub fn render_tool_names(tools: &[ToolDescriptor]) -> String {
    tools
        .iter()
        .map(|t| t.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Alternating `Human:` / `AI:` lines
pub fn render_history(history: &[Message]) -> String {
    history
        .iter()
        .map(|m| {
            let speaker = if m.is_user() { "Human" } else { "AI" };
            format!("{}: {}", speaker, m.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Steps taken so far, ending with the `Thought:` cue. Empty when no
/// step has been taken.
pub fn render_scratchpad(steps: &[IntermediateStep]) -> String {
    if steps.is_empty() {
        return String::new();
    }

    let mut scratchpad = String::new();
    for step in steps {
        scratchpad.push_str(&format!(
            "Action: {}\nAction Input: {}\nObservation: {}\n",
            step.tool, step.tool_input, step.observation
        ));
    }
    scratchpad.push_str("Thought:");
    scratchpad
}

/// Replace `{name}` placeholders in one pass.
///
/// Substituted values are never rescanned, so braces inside a question or
/// an observation come through untouched. Unknown placeholders are kept.
fn substitute(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len() + 256);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let value = after.find('}').and_then(|close| {
            let key = &after[..close];
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value, close))
        });

        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tools() -> Vec<ToolDescriptor> {
        vec![
            ToolDescriptor::new("Calculator", "does arithmetic"),
            ToolDescriptor::new("Search", "searches the web"),
        ]
    }

    #[test]
    fn test_tool_rendering() {
        assert_eq!(
            render_tools(&tools()),
            "Calculator: does arithmetic\nSearch: searches the web"
        );
        assert_eq!(render_tool_names(&tools()), "Calculator, Search");
    }

    #[test]
    fn test_history_rendering() {
        let history = vec![Message::user("what is 2+2?"), Message::assistant("4")];
        assert_eq!(render_history(&history), "Human: what is 2+2?\nAI: 4");
    }

    #[test]
    fn test_empty_scratchpad() {
        assert_eq!(render_scratchpad(&[]), "");

        let prompt = assemble("Q: {input}\n{agent_scratchpad}", &tools(), &[], "1+1", &[]);
        assert_eq!(prompt, "Q: 1+1\n");
        assert!(!prompt.contains("Observation:"));
    }

    #[test]
    fn test_scratchpad_blocks_in_order() {
        let steps = vec![
            IntermediateStep::success("Wikipedia", "circumference", "C = 2 * pi * r"),
            IntermediateStep::success("Calculator", "2 * pi * 2", "12.566"),
            IntermediateStep::error("Python", "print(", "Tool error: SyntaxError"),
        ];

        let scratchpad = render_scratchpad(&steps);
        assert_eq!(scratchpad.matches("Observation: ").count(), 3);
        assert!(scratchpad.ends_with("Thought:"));

        let first = scratchpad.find("C = 2 * pi * r").unwrap();
        let second = scratchpad.find("12.566").unwrap();
        let third = scratchpad.find("SyntaxError").unwrap();
        assert!(first < second && second < third);

        assert!(scratchpad.starts_with(
            "Action: Wikipedia\nAction Input: circumference\nObservation: C = 2 * pi * r\n"
        ));
    }

    #[test]
    fn test_full_template_substitution() {
        let assembler = PromptAssembler::new(tools());
        let history = vec![Message::user("hi"), Message::assistant("hello")];
        let prompt = assembler.assemble(&history, "what is 123 + 456 * 7?", &[]);

        assert!(prompt.contains("Calculator: does arithmetic\nSearch: searches the web"));
        assert!(prompt.contains("should be one of [Calculator, Search]"));
        assert!(prompt.contains("Conversation history:\nHuman: hi\nAI: hello"));
        assert!(prompt.ends_with("New question: what is 123 + 456 * 7?\n"));
        assert!(!prompt.contains("{tools}"));
        assert!(!prompt.contains("{agent_scratchpad}"));
    }

    #[test]
    fn test_observation_count_grows_with_steps() {
        let assembler = PromptAssembler::new(tools());
        let base = assembler
            .assemble(&[], "q", &[])
            .matches("\nObservation: ")
            .count();

        let steps = vec![
            IntermediateStep::success("Calculator", "1+1", "2"),
            IntermediateStep::success("Calculator", "2+2", "4"),
        ];
        let prompt = assembler.assemble(&[], "q", &steps);
        assert_eq!(prompt.matches("\nObservation: ").count(), base + 2);
        assert!(prompt.ends_with("Observation: 4\nThought:"));
    }

    #[test]
    fn test_assembly_is_deterministic() {
        let assembler = PromptAssembler::new(tools());
        let history = vec![Message::user("q0"), Message::assistant("a0")];
        let steps = vec![IntermediateStep::success("Calculator", "1+1", "2")];

        let a = assembler.assemble(&history, "q1", &steps);
        let b = assembler.assemble(&history, "q1", &steps);
        assert_eq!(a, b);
    }

    #[test]
    fn test_braces_in_values_are_not_expanded() {
        let prompt = assemble(
            "{input} | {agent_scratchpad}",
            &tools(),
            &[],
            "what is {history} in set {1, 2}?",
            &[],
        );
        assert_eq!(prompt, "what is {history} in set {1, 2}? | ");
    }

    #[test]
    fn test_unknown_placeholder_kept() {
        let prompt = assemble("{unknown} {input}", &[], &[], "x", &[]);
        assert_eq!(prompt, "{unknown} x");
    }
}
