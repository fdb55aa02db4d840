//! # Reader Loop
//!
//! Drains the transport for the lifetime of the link, classifying each line
//! and posting it to the session in read order.

use std::time::Duration;

use log::{debug, info, warn};

use super::{EventSender, LinkEvent, transport::LineSource};
use crate::protocol::{Line, classify_line};

/// Reads lines from `source` until the session stops listening.
///
/// Read errors are reported and retried after `retry_delay`, forever. Empty
/// lines and timeouts produce no event.
pub async fn run_reader<S: LineSource>(mut source: S, events: EventSender, retry_delay: Duration) {
    info!("reader loop started");
    while !events.is_closed() {
        match source.read_line().await {
            Ok(Some(raw)) => {
                let line = classify_line(&raw);
                if line == Line::Empty {
                    continue;
                }
                let raw = raw.trim().to_owned();
                debug!("rx: {raw}");
                if events.send(LinkEvent::Received { raw, line }).is_err() {
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!("serial read failed: {e}");
                if events.send(LinkEvent::ReadError(e.to_string())).is_err() {
                    break;
                }
                tokio::time::sleep(retry_delay).await;
            }
        }
    }
    info!("reader loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{HmiError, Result};
    use crate::link::event_channel;
    use std::collections::VecDeque;

    /// Replays a fixed script, then blocks forever.
    struct ScriptedSource {
        script: VecDeque<Result<Option<String>>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<Option<String>>>) -> Self {
            Self {
                script: script.into(),
            }
        }
    }

    impl LineSource for ScriptedSource {
        async fn read_line(&mut self) -> Result<Option<String>> {
            match self.script.pop_front() {
                Some(step) => step,
                None => std::future::pending().await,
            }
        }
    }

    const RETRY: Duration = Duration::from_millis(1);

    async fn next_event(rx: &mut crate::link::EventReceiver) -> LinkEvent {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("event in time")
            .expect("channel open")
    }

    #[tokio::test]
    async fn test_survives_repeated_read_errors() {
        let mut script: Vec<Result<Option<String>>> = (0..25)
            .map(|i| Err(HmiError::port_read(format!("glitch {i}"))))
            .collect();
        script.push(Ok(Some("STATUS RUN=1".to_string())));

        let (events, mut rx) = event_channel();
        let task = tokio::spawn(run_reader(ScriptedSource::new(script), events, RETRY));

        for i in 0..25 {
            match next_event(&mut rx).await {
                LinkEvent::ReadError(detail) => assert!(detail.contains(&format!("glitch {i}"))),
                other => panic!("expected read error, got {other:?}"),
            }
        }
        match next_event(&mut rx).await {
            LinkEvent::Received { raw, line } => {
                assert_eq!(raw, "STATUS RUN=1");
                assert!(matches!(line, Line::Status(_)));
            }
            other => panic!("expected status line, got {other:?}"),
        }
        assert!(!task.is_finished());
        task.abort();
    }

    #[tokio::test]
    async fn test_skips_empty_lines_and_timeouts() {
        let script = vec![
            Ok(None),
            Ok(Some("   ".to_string())),
            Ok(Some(String::new())),
            Ok(Some("hello world\r".to_string())),
        ];
        let (events, mut rx) = event_channel();
        let task = tokio::spawn(run_reader(ScriptedSource::new(script), events, RETRY));

        assert_eq!(
            next_event(&mut rx).await,
            LinkEvent::Received {
                raw: "hello world".to_string(),
                line: Line::Plain("hello world".to_string()),
            }
        );
        assert!(rx.try_recv().is_err());
        task.abort();
    }

    #[tokio::test]
    async fn test_preserves_read_order() {
        let script = vec![
            Ok(Some("boot ok".to_string())),
            Ok(Some("STATUS SPEED=4".to_string())),
            Ok(Some("STATUS SPEED=5".to_string())),
        ];
        let (events, mut rx) = event_channel();
        let task = tokio::spawn(run_reader(ScriptedSource::new(script), events, RETRY));

        let mut raws = Vec::new();
        for _ in 0..3 {
            if let LinkEvent::Received { raw, .. } = next_event(&mut rx).await {
                raws.push(raw);
            }
        }
        assert_eq!(raws, vec!["boot ok", "STATUS SPEED=4", "STATUS SPEED=5"]);
        task.abort();
    }

    #[tokio::test]
    async fn test_stops_when_session_is_gone() {
        let script = vec![Ok(Some("late line".to_string()))];
        let (events, rx) = event_channel();
        drop(rx);

        tokio::time::timeout(
            Duration::from_secs(2),
            run_reader(ScriptedSource::new(script), events, RETRY),
        )
        .await
        .expect("reader returns once the receiver is dropped");
    }
}
