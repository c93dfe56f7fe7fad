//! Find & Replace node
//!
//! Literal or regex substitution over the incoming text. `global` and
//! `case_sensitive` are user parameters; in literal mode the replacement
//! text is taken verbatim, in regex mode `$1`-style group references
//! expand.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use graph_engine::engine::ProcessContext;
use graph_engine::registry::{
    NodeProcessor, ProcessorError, ProcessorOutput, ProcessorRegistration,
};
use graph_engine::{NodeCategory, NodeMetadata, SocketMetadata, SocketType};
use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use serde_json::json;

/// Process-wide cache of compiled patterns; typing in the find field
/// recompiles on every keystroke otherwise
static PATTERN_CACHE: Lazy<Mutex<HashMap<String, Regex>>> = Lazy::new(Default::default);

const PATTERN_CACHE_LIMIT: usize = 256;

fn compiled(pattern: &str) -> Result<Regex, regex::Error> {
    if let Some(regex) = PATTERN_CACHE.lock().unwrap().get(pattern) {
        return Ok(regex.clone());
    }
    let regex = Regex::new(pattern)?;
    let mut cache = PATTERN_CACHE.lock().unwrap();
    if cache.len() >= PATTERN_CACHE_LIMIT {
        cache.clear();
    }
    cache.insert(pattern.to_string(), regex.clone());
    Ok(regex)
}

pub struct FindReplaceNode;

impl FindReplaceNode {
    pub const TYPE: &'static str = "find_replace";
    pub const SOCKET_TEXT: &'static str = "text";

    pub fn descriptor() -> NodeMetadata {
        NodeMetadata {
            node_type: Self::TYPE.to_string(),
            category: NodeCategory::Processing,
            label: "Find & Replace".to_string(),
            description: "Substitutes literal text or regex matches".to_string(),
            inputs: vec![SocketMetadata::required(
                Self::SOCKET_TEXT,
                "Text",
                SocketType::Text,
            )],
            outputs: vec![SocketMetadata::optional(
                Self::SOCKET_TEXT,
                "Text",
                SocketType::Text,
            )],
        }
    }
}

impl NodeProcessor for FindReplaceNode {
    fn process(&self, ctx: &ProcessContext<'_>) -> Result<ProcessorOutput, ProcessorError> {
        let text = ctx.require_text(Self::SOCKET_TEXT)?;
        let find = ctx.param_or("find", "");
        let replace = ctx.param_or("replace", "");
        let use_regex = ctx.param_bool("use_regex", false);
        let case_sensitive = ctx.param_bool("case_sensitive", true);
        let global = ctx.param_bool("global", false);

        if find.is_empty() {
            // Nothing to find; pass the text through untouched
            return Ok(ProcessorOutput::empty().with(Self::SOCKET_TEXT, json!(text)));
        }

        let mut pattern = if use_regex {
            find.to_string()
        } else {
            regex::escape(find)
        };
        if !case_sensitive {
            pattern = format!("(?i){}", pattern);
        }
        let regex = compiled(&pattern)
            .map_err(|e| ProcessorError::bad_parameter(format!("invalid pattern: {}", e)))?;

        let matches = regex.find_iter(text).count();
        let limit = if global { 0 } else { 1 };
        let replaced = if use_regex {
            regex.replacen(text, limit, replace)
        } else {
            regex.replacen(text, limit, NoExpand(replace))
        };
        let count = if global { matches } else { matches.min(1) };

        Ok(ProcessorOutput::empty()
            .with(Self::SOCKET_TEXT, json!(replaced.into_owned()))
            .with_status(format!("{} replacement(s)", count)))
    }
}

inventory::submit!(ProcessorRegistration::new(
    FindReplaceNode::descriptor,
    || Arc::new(FindReplaceNode) as Arc<dyn NodeProcessor>
));
