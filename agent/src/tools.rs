//! The document operations an agent runtime registers as callable tools.
//! Each takes the raw document text and parses it afresh.

use std::fmt;
use std::str::FromStr;

use interro::{Block, Document, ParseOptions};
use log::info;
use serde::Serialize;

use crate::error::AgentError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Render,
    Parse,
    Critique,
    Improve,
}

/// What a tool hands back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolOutput {
    Text(String),
    Blocks(Vec<Block>),
}

impl ToolOutput {
    pub fn to_json(&self) -> Result<String, AgentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Tool {
    pub const ALL: [Tool; 4] = [Tool::Render, Tool::Parse, Tool::Critique, Tool::Improve];

    pub fn name(self) -> &'static str {
        match self {
            Tool::Render => "render",
            Tool::Parse => "parse",
            Tool::Critique => "critique",
            Tool::Improve => "improve",
        }
    }

    /// One-line description shown to the model when the tool is registered.
    pub fn description(self) -> &'static str {
        match self {
            Tool::Render => "Return the document text with all block markup removed.",
            Tool::Parse => "Return the blocks of the document with their prompts and contents.",
            Tool::Critique => "Return critique instructions for every top-level block.",
            Tool::Improve => "Return improve instructions for every writable top-level block.",
        }
    }

    pub fn invoke(self, doc: &str, options: ParseOptions) -> Result<ToolOutput, AgentError> {
        info!("tool call: {}", self);
        Ok(match self {
            Tool::Render => ToolOutput::Text(render(doc, options)?),
            Tool::Parse => ToolOutput::Blocks(parse(doc, options)?),
            Tool::Critique => ToolOutput::Text(critique(doc, options)?),
            Tool::Improve => ToolOutput::Text(improve(doc, options)?),
        })
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tool {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tool::ALL
            .into_iter()
            .find(|tool| tool.name() == s)
            .ok_or_else(|| AgentError::UnknownTool(s.to_string()))
    }
}

pub fn render(doc: &str, options: ParseOptions) -> Result<String, AgentError> {
    Ok(Document::parse_with(doc, options)?.render())
}

pub fn parse(doc: &str, options: ParseOptions) -> Result<Vec<Block>, AgentError> {
    Ok(Document::parse_with(doc, options)?.blocks().to_vec())
}

/// `name\n<critique>\n\n` for each top-level block.
pub fn critique(doc: &str, options: ParseOptions) -> Result<String, AgentError> {
    let document = Document::parse_with(doc, options)?;
    let mut response = String::new();
    for block in document.blocks() {
        push_section(&mut response, &block.name, &block.critique());
    }
    Ok(response)
}

/// Like [`critique`], but read-only blocks are left out.
pub fn improve(doc: &str, options: ParseOptions) -> Result<String, AgentError> {
    let document = Document::parse_with(doc, options)?;
    let mut response = String::new();
    for block in document.blocks() {
        if !block.access.is_writable() {
            info!("improve: skipping read-only block `{}`", block.name);
            continue;
        }
        push_section(&mut response, &block.name, &block.improve()?);
    }
    Ok(response)
}

fn push_section(response: &mut String, name: &str, instruction: &str) {
    response.push_str(name);
    response.push('\n');
    response.push_str(instruction);
    response.push_str("\n\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DOC: &str = "\
!interro intro ro \"introductory block\"
hello
!end intro
!interro risks rw \"must name one risk\"
parsing is hard
!end risks";

    #[test]
    fn tool_names_round_trip() {
        for tool in Tool::ALL {
            assert_eq!(tool.name().parse::<Tool>().unwrap(), tool);
        }
        assert!(matches!(
            "summarize".parse::<Tool>(),
            Err(AgentError::UnknownTool(name)) if name == "summarize"
        ));
    }

    #[test]
    fn render_tool() {
        let out = Tool::Render.invoke(DOC, ParseOptions::default()).unwrap();
        assert_eq!(out, ToolOutput::Text("hello\nparsing is hard\n".to_string()));
    }

    #[test]
    fn parse_tool_returns_top_level_blocks() {
        let ToolOutput::Blocks(blocks) = Tool::Parse.invoke(DOC, ParseOptions::default()).unwrap()
        else {
            panic!("expected blocks");
        };
        let names: Vec<_> = blocks.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["intro", "risks"]);
    }

    #[test]
    fn critique_covers_every_top_level_block() {
        let text = critique(DOC, ParseOptions::default()).unwrap();
        assert!(text.starts_with("intro\nPlease read the full text"));
        assert!(text.contains("\n\nrisks\nPlease read the full text"));
        assert!(text.ends_with("\n\n"));
    }

    #[test]
    fn improve_skips_read_only_blocks() {
        let text = improve(DOC, ParseOptions::default()).unwrap();
        assert!(text.starts_with("risks\n"));
        assert!(!text.contains("introductory block"));
        assert!(text.contains("\"must name one risk\""));
    }

    #[test]
    fn malformed_documents_fail_every_tool() {
        for tool in Tool::ALL {
            let err = tool.invoke("!interro one ro", ParseOptions::default()).unwrap_err();
            assert_eq!(err.parse_error().and_then(|e| e.block_name()), Some("one"));
        }
    }

    #[test]
    fn outputs_serialize_to_json() {
        let out = Tool::Parse.invoke(DOC, ParseOptions::default()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&out.to_json().unwrap()).unwrap();
        assert_eq!(json[1]["name"], "risks");
        assert_eq!(json[1]["access"], "rw");
        assert!(json[1].get("response").is_none());

        let text = ToolOutput::Text("hello".into()).to_json().unwrap();
        assert_eq!(text, "\"hello\"");
    }
}
