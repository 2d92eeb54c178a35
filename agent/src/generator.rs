use interro::{Block, Document, Error, Instruction};
use log::{debug, info};

use crate::config::AgentConfig;
use crate::error::AgentError;

/// A capability that turns an instruction into generated text. This crate
/// never talks to a model itself; credentials and transport live with the
/// implementor.
pub trait TextGenerator {
    fn generate(&self, system: Option<&str>, instruction: &str) -> Result<String, AgentError>;
}

/// Returns exactly what a model would have been sent. Used for dry runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoGenerator;

impl TextGenerator for EchoGenerator {
    fn generate(&self, system: Option<&str>, instruction: &str) -> Result<String, AgentError> {
        Ok(match system {
            Some(system) => format!("{}\n\n{}", system, instruction),
            None => instruction.to_string(),
        })
    }
}

impl<F> TextGenerator for F
where
    F: Fn(Option<&str>, &str) -> Result<String, AgentError>,
{
    fn generate(&self, system: Option<&str>, instruction: &str) -> Result<String, AgentError> {
        self(system, instruction)
    }
}

/// Sends block instructions to a generator and records the replies in each
/// block's `response` slot.
pub struct Agent<G> {
    config: AgentConfig,
    global_prompt: Option<String>,
    generator: G,
}

impl<G: TextGenerator> Agent<G> {
    /// Reads the configured global prompt once, up front.
    pub fn new(config: AgentConfig, generator: G) -> Result<Self, AgentError> {
        let global_prompt = config.read_global_prompt()?;
        Ok(Agent {
            config,
            global_prompt,
            generator,
        })
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// The system text sent with every request: the agent instruction,
    /// followed by the global prompt when one is configured.
    pub fn system_prompt(&self) -> String {
        match &self.global_prompt {
            Some(global) => format!("{}\n\n{}", self.config.instruction, global),
            None => self.config.instruction.clone(),
        }
    }

    /// Parse `text` with the configured options.
    pub fn load(&self, text: &str) -> Result<Document, AgentError> {
        Ok(Document::parse_with(text, self.config.parse_options(text))?)
    }

    /// Answer one block by name.
    pub fn respond_to(
        &self,
        doc: &Document,
        instruction: Instruction,
        name: &str,
    ) -> Result<Block, AgentError> {
        let text = match instruction {
            Instruction::Critique => doc.criticise_block(name)?,
            Instruction::Improve => doc.improve_block(name)?,
        };
        let block = doc.get_block(name).ok_or_else(|| Error::NotFound {
            name: name.to_string(),
        })?;
        self.answer(block, &text)
    }

    /// Answer every top-level block the instruction applies to; improve skips
    /// read-only blocks.
    pub fn respond(&self, doc: &Document, instruction: Instruction) -> Result<Vec<Block>, AgentError> {
        let mut answered = Vec::new();
        for block in doc.blocks() {
            let text = match instruction {
                Instruction::Critique => block.critique(),
                Instruction::Improve if block.access.is_writable() => block.improve()?,
                Instruction::Improve => {
                    debug!("{}: skipping read-only block `{}`", instruction, block.name);
                    continue;
                }
            };
            answered.push(self.answer(block, &text)?);
        }
        Ok(answered)
    }

    fn answer(&self, block: &Block, instruction: &str) -> Result<Block, AgentError> {
        info!(
            "{} ({}): generating response for block `{}`",
            self.config.name, self.config.model, block.name
        );
        let system = self.system_prompt();
        let response = self.generator.generate(Some(&system), instruction)?;
        Ok(block.clone().with_response(response))
    }
}
