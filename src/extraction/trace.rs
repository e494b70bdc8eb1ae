//! Execution-trace sampling through the injected reflection host.
//!
//! The host observes the script actually running and reports named events;
//! this strategy maps each event back onto the fixed opcode table by name.
//! Unrecognized event names become no-op placeholders so the sampled sequence
//! keeps its original length and ordering.

use std::str::FromStr;

use crate::extraction::RawOp;
use crate::instruction::OpCode;
use crate::script::{ReflectionHost, ScriptObject};
use crate::Result;

pub(crate) fn extract(script: &dyn ScriptObject, host: &dyn ReflectionHost) -> Result<Vec<RawOp>> {
    let events = host.sample_trace(script.identity())?;
    Ok(events
        .into_iter()
        .map(|event| {
            let opcode = OpCode::from_str(&event.name).unwrap_or(OpCode::Nop);
            RawOp::new(opcode, event.values)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::{InMemoryScript, TraceEvent};
    use crate::Error;

    struct ScriptedHost(Vec<TraceEvent>);

    impl ReflectionHost for ScriptedHost {
        fn sample_trace(&self, _identity: &str) -> Result<Vec<TraceEvent>> {
            Ok(self.0.clone())
        }
    }

    struct TimeoutHost;

    impl ReflectionHost for TimeoutHost {
        fn sample_trace(&self, _identity: &str) -> Result<Vec<TraceEvent>> {
            Err(Error::Host("trace timed out".to_string()))
        }
    }

    #[test]
    fn test_events_map_by_name() {
        let host = ScriptedHost(vec![
            TraceEvent::new("LoadK", vec![0, 42]),
            TraceEvent::new("Add", vec![2, 0, 1]),
            TraceEvent::new("Return", vec![]),
        ]);
        let script = InMemoryScript::without_text("game.Hidden");

        let ops = extract(&script, &host).unwrap();
        assert_eq!(ops.len(), 3);
        assert_eq!(ops[0].opcode, OpCode::LoadK);
        assert_eq!(ops[0].operands, vec![0, 42]);
        assert_eq!(ops[2].opcode, OpCode::Return);
    }

    #[test]
    fn test_unknown_events_become_placeholders() {
        let host = ScriptedHost(vec![
            TraceEvent::new("VendorSpecificOp", vec![1]),
            TraceEvent::new("Return", vec![]),
        ]);
        let script = InMemoryScript::without_text("game.Hidden");

        let ops = extract(&script, &host).unwrap();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].opcode, OpCode::Nop);
    }

    #[test]
    fn test_host_errors_propagate() {
        let script = InMemoryScript::without_text("game.Hidden");
        assert!(matches!(
            extract(&script, &TimeoutHost),
            Err(Error::Host(_))
        ));
    }
}
