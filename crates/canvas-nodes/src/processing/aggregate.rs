//! Aggregate node
//!
//! Group-by with a reducer over a record array. `groupBy` names the
//! grouping field, `aggFunc` selects sum, count, or avg, and `aggKey`
//! names the value field. Output rows carry the group value plus a
//! `<func>_of_<key>` field. Groups keep first-seen order.
//!
//! Numeric semantics: non-numeric or missing values coerce to 0 for sum;
//! avg divides by group cardinality (never zero, a group always has at
//! least one member); count ignores the value field entirely.

use std::collections::HashMap;
use std::sync::Arc;

use graph_engine::engine::ProcessContext;
use graph_engine::registry::{
    NodeProcessor, ProcessorError, ProcessorOutput, ProcessorRegistration,
};
use graph_engine::{NodeCategory, NodeMetadata, SocketMetadata, SocketType};
use serde_json::Value;

use crate::expr::{as_number, number_value};

/// The supported reducers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AggFunc {
    Sum,
    Count,
    Avg,
}

impl AggFunc {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "sum" => Some(Self::Sum),
            "count" => Some(Self::Count),
            "avg" => Some(Self::Avg),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Count => "count",
            Self::Avg => "avg",
        }
    }
}

pub struct AggregateNode;

impl AggregateNode {
    pub const TYPE: &'static str = "aggregate";
    pub const SOCKET_RECORDS: &'static str = "records";

    pub fn descriptor() -> NodeMetadata {
        NodeMetadata {
            node_type: Self::TYPE.to_string(),
            category: NodeCategory::Processing,
            label: "Aggregate".to_string(),
            description: "Groups records and reduces with sum, count, or avg".to_string(),
            inputs: vec![SocketMetadata::required(
                Self::SOCKET_RECORDS,
                "Records",
                SocketType::Records,
            )],
            outputs: vec![SocketMetadata::optional(
                Self::SOCKET_RECORDS,
                "Records",
                SocketType::Records,
            )],
        }
    }
}

impl NodeProcessor for AggregateNode {
    fn process(&self, ctx: &ProcessContext<'_>) -> Result<ProcessorOutput, ProcessorError> {
        let records = ctx.require_records(Self::SOCKET_RECORDS)?;

        let group_by = ctx.param_or("groupBy", "");
        if group_by.trim().is_empty() {
            return Err(ProcessorError::bad_parameter("groupBy is required"));
        }
        let func_name = ctx.param_or("aggFunc", "sum");
        let func = AggFunc::parse(func_name).ok_or_else(|| {
            ProcessorError::bad_parameter(format!("unknown aggregate function '{}'", func_name))
        })?;
        let agg_key = ctx.param_or("aggKey", "");
        if agg_key.is_empty() && func != AggFunc::Count {
            return Err(ProcessorError::bad_parameter(format!(
                "{} needs an aggKey",
                func.name()
            )));
        }

        // Group members, preserving first-seen group order
        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, (Value, Vec<&Value>)> = HashMap::new();
        for record in records {
            let group_value = record.get(group_by).cloned().unwrap_or(Value::Null);
            let group_key = group_key_string(&group_value);
            groups
                .entry(group_key.clone())
                .or_insert_with(|| {
                    order.push(group_key);
                    (group_value, Vec::new())
                })
                .1
                .push(record);
        }

        let result_field = if agg_key.is_empty() {
            func.name().to_string()
        } else {
            format!("{}_of_{}", func.name(), agg_key)
        };

        let mut rows = Vec::with_capacity(order.len());
        for key in &order {
            let Some((group_value, members)) = groups.get(key) else {
                continue;
            };
            let reduced = match func {
                AggFunc::Count => members.len() as f64,
                AggFunc::Sum => sum(members, agg_key),
                AggFunc::Avg => sum(members, agg_key) / members.len() as f64,
            };

            let mut row = serde_json::Map::new();
            row.insert(group_by.to_string(), group_value.clone());
            row.insert(result_field.clone(), number_value(reduced));
            rows.push(Value::Object(row));
        }

        let status = format!("{} group(s)", rows.len());
        Ok(ProcessorOutput::empty()
            .with(Self::SOCKET_RECORDS, Value::Array(rows))
            .with_status(status))
    }
}

/// Sum a value field over group members; non-numeric and missing coerce
/// to 0
fn sum(members: &[&Value], key: &str) -> f64 {
    members
        .iter()
        .map(|record| {
            record
                .get(key)
                .and_then(as_number)
                .unwrap_or(0.0)
        })
        .sum()
}

fn group_key_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

inventory::submit!(ProcessorRegistration::new(
    AggregateNode::descriptor,
    || Arc::new(AggregateNode) as Arc<dyn NodeProcessor>
));
