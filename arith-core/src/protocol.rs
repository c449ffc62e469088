//! Quiz channel messages. Inbound and outbound are closed sets; anything else
//! is rejected at the boundary.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Client -> server. Exactly one recognized key per message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum Inbound {
    /// `{"next": true}`: request the first or next puzzle.
    Next,
    /// `{"answer": <string-or-number>}`: answer to the open trial.
    Answer(AnswerValue),
}

/// Server -> client, addressed to the requesting participant only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outbound {
    /// Embeddable image payload for the puzzle text.
    Image(String),
    /// Whether the latest answer was correct.
    Feedback(bool),
}

/// Raw answer as submitted; parsed by the handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Text(String),
    Number(serde_json::Number),
}

impl AnswerValue {
    /// Parse as a base-10 integer. Text is trimmed; numbers must be integral.
    pub fn parse(&self) -> Result<i64, MalformedAnswer> {
        match self {
            AnswerValue::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| MalformedAnswer(s.clone())),
            AnswerValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    return Ok(i);
                }
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(&f) => {
                        Ok(f as i64)
                    }
                    _ => Err(MalformedAnswer(n.to_string())),
                }
            }
        }
    }
}

impl From<i64> for AnswerValue {
    fn from(v: i64) -> Self {
        AnswerValue::Number(v.into())
    }
}

impl From<&str> for AnswerValue {
    fn from(v: &str) -> Self {
        AnswerValue::Text(v.to_string())
    }
}

impl TryFrom<Value> for Inbound {
    type Error = MessageError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(map) = value else {
            return Err(MessageError::NotAnObject);
        };
        if map.len() != 1 {
            return Err(MessageError::KeyCount(map.len()));
        }
        let Some((key, v)) = map.into_iter().next() else {
            return Err(MessageError::KeyCount(0));
        };
        match (key.as_str(), v) {
            ("next", Value::Bool(true)) => Ok(Inbound::Next),
            ("answer", Value::String(s)) => Ok(Inbound::Answer(AnswerValue::Text(s))),
            ("answer", Value::Number(n)) => Ok(Inbound::Answer(AnswerValue::Number(n))),
            ("next" | "answer", _) => Err(MessageError::BadValue(key)),
            _ => Err(MessageError::UnknownKey(key)),
        }
    }
}

impl From<Inbound> for Value {
    fn from(msg: Inbound) -> Self {
        match msg {
            Inbound::Next => serde_json::json!({ "next": true }),
            Inbound::Answer(AnswerValue::Text(s)) => serde_json::json!({ "answer": s }),
            Inbound::Answer(AnswerValue::Number(n)) => serde_json::json!({ "answer": n }),
        }
    }
}

/// Inbound message with an unrecognized shape.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MessageError {
    #[error("message is not an object")]
    NotAnObject,
    #[error("expected exactly one key, got {0}")]
    KeyCount(usize),
    #[error("unknown key {0:?}")]
    UnknownKey(String),
    #[error("bad value for key {0:?}")]
    BadValue(String),
}

/// Answer that is not an integer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("answer {0:?} is not an integer")]
pub struct MalformedAnswer(pub String);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn inbound(v: Value) -> Result<Inbound, MessageError> {
        Inbound::try_from(v)
    }

    #[test]
    fn accepts_next_and_answer() {
        assert_eq!(inbound(json!({"next": true})), Ok(Inbound::Next));
        assert_eq!(
            inbound(json!({"answer": "46"})),
            Ok(Inbound::Answer(AnswerValue::Text("46".into())))
        );
        assert_eq!(
            inbound(json!({"answer": 46})),
            Ok(Inbound::Answer(AnswerValue::from(46i64)))
        );
    }

    #[test]
    fn rejects_other_shapes() {
        assert_eq!(inbound(json!([1, 2])), Err(MessageError::NotAnObject));
        assert_eq!(inbound(json!({})), Err(MessageError::KeyCount(0)));
        assert_eq!(
            inbound(json!({"next": true, "answer": 1})),
            Err(MessageError::KeyCount(2))
        );
        assert_eq!(
            inbound(json!({"next": false})),
            Err(MessageError::BadValue("next".into()))
        );
        assert_eq!(
            inbound(json!({"answer": null})),
            Err(MessageError::BadValue("answer".into()))
        );
        assert_eq!(
            inbound(json!({"skip": true})),
            Err(MessageError::UnknownKey("skip".into()))
        );
    }

    #[test]
    fn deserialize_goes_through_validation() {
        let msg: Inbound = serde_json::from_str(r#"{"answer":" 12 "}"#).unwrap();
        assert_eq!(msg, Inbound::Answer(AnswerValue::Text(" 12 ".into())));
        assert!(serde_json::from_str::<Inbound>(r#"{"next":1}"#).is_err());
        assert_eq!(
            serde_json::to_value(Inbound::Next).unwrap(),
            json!({"next": true})
        );
    }

    #[test]
    fn outbound_shapes() {
        assert_eq!(
            serde_json::to_value(Outbound::Image("data".into())).unwrap(),
            json!({"image": "data"})
        );
        assert_eq!(
            serde_json::to_value(Outbound::Feedback(false)).unwrap(),
            json!({"feedback": false})
        );
    }

    #[test]
    fn answer_parsing() {
        assert_eq!(AnswerValue::from(" 46\n").parse(), Ok(46));
        assert_eq!(AnswerValue::from("-3").parse(), Ok(-3));
        assert_eq!(AnswerValue::from(46i64).parse(), Ok(46));
        let float: AnswerValue = serde_json::from_str("46.0").unwrap();
        assert_eq!(float.parse(), Ok(46));
        let frac: AnswerValue = serde_json::from_str("4.5").unwrap();
        assert!(frac.parse().is_err());
        assert_eq!(
            AnswerValue::from("forty").parse(),
            Err(MalformedAnswer("forty".into()))
        );
        assert!(AnswerValue::from("").parse().is_err());
        let min: AnswerValue = serde_json::from_str("-9223372036854775808.0").unwrap();
        assert_eq!(min.parse(), Ok(i64::MIN));
        let huge: AnswerValue = serde_json::from_str("1e19").unwrap();
        assert!(huge.parse().is_err());
    }
}
