// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use async_graphql_value::ConstValue;
use indexmap::IndexMap;
use serde::de::Error;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum ValNumber {
    I64(i64),
    U64(u64),
    F64(f64),
}

impl ValNumber {
    pub fn as_f64(&self) -> f64 {
        match self {
            ValNumber::I64(n) => *n as f64,
            ValNumber::U64(n) => *n as f64,
            ValNumber::F64(n) => *n,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ValNumber::I64(n) => Some(*n),
            ValNumber::U64(n) => i64::try_from(*n).ok(),
            ValNumber::F64(_) => None,
        }
    }
}

impl From<&serde_json::Number> for ValNumber {
    fn from(value: &serde_json::Number) -> Self {
        if let Some(n) = value.as_i64() {
            ValNumber::I64(n)
        } else if let Some(n) = value.as_u64() {
            ValNumber::U64(n)
        } else {
            // serde_json numbers that are neither i64 nor u64 are always representable as f64
            ValNumber::F64(value.as_f64().unwrap_or(f64::NAN))
        }
    }
}

/// An argument value, after variables have been substituted.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Val {
    Bool(bool),
    Number(ValNumber),
    String(String),
    List(Vec<Val>),
    Object(IndexMap<String, Val>),
    Enum(String),
    Null,
}

impl Val {
    pub fn get(&self, key: &str) -> Option<&Val> {
        match self {
            Val::Object(o) => o.get(key),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Val::String(s) | Val::Enum(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Val::Number(n) => n.as_i64(),
            _ => None,
        }
    }
}

impl TryFrom<ConstValue> for Val {
    type Error = serde_json::Error;

    fn try_from(value: ConstValue) -> Result<Self, Self::Error> {
        match value {
            ConstValue::Null => Ok(Val::Null),
            ConstValue::Boolean(b) => Ok(Val::Bool(b)),
            ConstValue::Number(n) => Ok(Val::Number((&n).into())),
            ConstValue::String(s) => Ok(Val::String(s)),
            ConstValue::List(l) => Ok(Val::List(
                l.into_iter()
                    .map(Val::try_from)
                    .collect::<Result<_, _>>()?,
            )),
            ConstValue::Object(o) => Ok(Val::Object(
                o.into_iter()
                    .map(|(k, v)| Ok((k.to_string(), Val::try_from(v)?)))
                    .collect::<Result<_, serde_json::Error>>()?,
            )),
            ConstValue::Enum(e) => Ok(Val::Enum(e.to_string())),
            ConstValue::Binary(_) => Err(serde_json::Error::custom("Binary is not supported")),
        }
    }
}

impl From<serde_json::Value> for Val {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Val::Null,
            serde_json::Value::Bool(b) => Val::Bool(b),
            serde_json::Value::Number(n) => Val::Number((&n).into()),
            serde_json::Value::String(s) => Val::String(s),
            serde_json::Value::Array(l) => Val::List(l.into_iter().map(Val::from).collect()),
            serde_json::Value::Object(o) => {
                Val::Object(o.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}
