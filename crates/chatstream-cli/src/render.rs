//! Terminal rendering of chat views.
//!
//! Streamed text goes to stdout as it arrives; status lines and tool output
//! go to stderr so piping stdout captures only the answer.

use std::io::{self, Write};
use std::sync::Mutex;

use chatstream_client::{ChatView, ViewObserver};
use chatstream_core::{Author, Message, Phase, ToolRecord};

/// Renders the in-flight reply incrementally.
pub struct TerminalRenderer {
    show_tools: bool,
    state: Mutex<RenderState>,
}

struct RenderState {
    out: Box<dyn Write + Send>,
    err: Box<dyn Write + Send>,
    /// Index of the message being rendered.
    index: Option<usize>,
    last_phase: Option<Phase>,
    /// Bytes of streamed content already written.
    printed: usize,
    tools_shown: usize,
    done: bool,
}

impl TerminalRenderer {
    /// Render to the process stdout/stderr.
    pub fn stdio(show_tools: bool) -> Self {
        Self::new(Box::new(io::stdout()), Box::new(io::stderr()), show_tools)
    }

    fn new(out: Box<dyn Write + Send>, err: Box<dyn Write + Send>, show_tools: bool) -> Self {
        Self {
            show_tools,
            state: Mutex::new(RenderState {
                out,
                err,
                index: None,
                last_phase: None,
                printed: 0,
                tools_shown: 0,
                done: false,
            }),
        }
    }
}

impl ViewObserver for TerminalRenderer {
    fn on_view(&self, view: &ChatView) {
        let Some(message) = view.conversation.last() else {
            return;
        };
        if message.author != Author::Bot {
            return;
        }

        let Ok(mut state) = self.state.lock() else {
            return;
        };
        // Terminal write errors are not worth failing the exchange over.
        let _ = state.render(view.conversation.len() - 1, message, view, self.show_tools);
    }
}

impl RenderState {
    fn render(
        &mut self,
        index: usize,
        message: &Message,
        view: &ChatView,
        show_tools: bool,
    ) -> io::Result<()> {
        if self.index != Some(index) {
            self.index = Some(index);
            self.last_phase = None;
            self.printed = 0;
            self.tools_shown = 0;
            self.done = message.phase().is_none() && !message.is_in_flight();
        }
        if self.done {
            return Ok(());
        }

        if show_tools {
            for (n, record) in message.tool_records.iter().enumerate().skip(self.tools_shown) {
                write_tool_record(&mut self.err, n + 1, record)?;
            }
        }
        self.tools_shown = message.tool_records.len();

        let phase = message.phase();
        match phase {
            Some(Phase::Streaming) => {
                if let Some(delta) = message.content.get(self.printed..) {
                    self.out.write_all(delta.as_bytes())?;
                    self.out.flush()?;
                    self.printed = message.content.len();
                }
            }
            Some(status) if self.last_phase != Some(status) => {
                // Keep stdout to the answer alone; break the terminal line on stderr.
                if self.printed > 0 {
                    writeln!(self.err)?;
                }
                writeln!(self.err, "  · {}", message.content)?;
            }
            _ => {}
        }
        self.last_phase = phase;

        if !view.awaiting && !message.is_in_flight() {
            if view.error.is_some() || self.printed == 0 {
                if self.printed > 0 {
                    writeln!(self.out)?;
                }
                writeln!(self.out, "{}", message.content)?;
            } else {
                writeln!(self.out)?;
            }
            self.out.flush()?;
            self.done = true;
        }

        Ok(())
    }
}

fn write_tool_record(w: &mut dyn Write, n: usize, record: &ToolRecord) -> io::Result<()> {
    let time = record
        .observed_at
        .with_timezone(&chrono::Local)
        .format("%H:%M:%S");
    writeln!(w, "  ┌ Tool Call #{} ({})", n, time)?;
    for line in record.display_text().lines() {
        writeln!(w, "  │ {}", line)?;
    }
    writeln!(w, "  └")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chatstream_core::{Chunk, Conversation, Reducer};
    use serde_json::json;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Buffer {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn renderer(show_tools: bool) -> (TerminalRenderer, Buffer, Buffer) {
        let out = Buffer::default();
        let err = Buffer::default();
        let renderer =
            TerminalRenderer::new(Box::new(out.clone()), Box::new(err.clone()), show_tools);
        (renderer, out, err)
    }

    fn view(conversation: &Conversation, awaiting: bool, error: Option<&str>) -> ChatView {
        ChatView {
            conversation: conversation.clone(),
            awaiting,
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn test_streams_deltas_to_stdout() {
        let (renderer, out, err) = renderer(true);
        let reducer = Reducer::default();

        let mut conversation = Conversation::new().begin_exchange("hi").unwrap();
        renderer.on_view(&view(&conversation, true, None));

        let chunks = vec![
            Chunk::Thinking {
                text: String::new(),
            },
            Chunk::ToolEnd {
                text: "{\"k\":1}".to_string(),
                structured: Some(json!({"k": 1})),
            },
            Chunk::stream("Hel"),
            Chunk::stream("lo"),
        ];
        for chunk in chunks {
            conversation = reducer.apply(&conversation, chunk).unwrap();
            renderer.on_view(&view(&conversation, true, None));
        }
        conversation = conversation.finalize().unwrap();
        renderer.on_view(&view(&conversation, false, None));
        // Repeated views of a finished reply print nothing more.
        renderer.on_view(&view(&conversation, false, None));

        assert_eq!(out.text(), "Hello\n");
        let status = err.text();
        assert!(status.contains("· Thinking..."));
        assert!(status.contains("· Processing results..."));
        assert!(status.contains("Tool Call #1"));
        assert!(status.contains("\"k\": 1"));
    }

    #[test]
    fn test_failure_prints_error_text() {
        let (renderer, out, _err) = renderer(false);
        let reducer = Reducer::default();

        let mut conversation = Conversation::new().begin_exchange("hi").unwrap();
        renderer.on_view(&view(&conversation, true, None));
        conversation = reducer.apply(&conversation, Chunk::stream("par")).unwrap();
        renderer.on_view(&view(&conversation, true, None));
        conversation = conversation.fail("Sorry").unwrap();
        renderer.on_view(&view(&conversation, false, Some("Sorry")));

        assert_eq!(out.text(), "par\nSorry\n");
    }

    #[test]
    fn test_status_only_reply_is_printed_at_end() {
        let (renderer, out, err) = renderer(false);
        let reducer = Reducer::default();

        let mut conversation = Conversation::new().begin_exchange("hi").unwrap();
        conversation = reducer
            .apply(&conversation, Chunk::tool_end("ignored when tools hidden"))
            .unwrap();
        renderer.on_view(&view(&conversation, true, None));
        conversation = conversation.finalize().unwrap();
        renderer.on_view(&view(&conversation, false, None));

        assert_eq!(out.text(), "Processing results...\n");
        assert!(!err.text().contains("Tool Call"));
    }

    #[test]
    fn test_status_between_stream_chunks_keeps_stdout_contiguous() {
        let (renderer, out, err) = renderer(false);
        let reducer = Reducer::default();

        let mut conversation = Conversation::new().begin_exchange("hi").unwrap();
        renderer.on_view(&view(&conversation, true, None));
        let chunks = vec![
            Chunk::stream("partial"),
            Chunk::tool_end("lookup"),
            Chunk::stream(" answer"),
            Chunk::tool_end("late"),
        ];
        for chunk in chunks {
            conversation = reducer.apply(&conversation, chunk).unwrap();
            renderer.on_view(&view(&conversation, true, None));
        }
        conversation = conversation.finalize().unwrap();
        renderer.on_view(&view(&conversation, false, None));

        assert_eq!(out.text(), "partial answer\n");
        assert_eq!(err.text().matches("· Processing results...").count(), 2);
    }

    #[test]
    fn test_greeting_is_not_rerendered() {
        let (renderer, out, _err) = renderer(false);
        let conversation = Conversation::with_greeting("Hello!");
        renderer.on_view(&view(&conversation, false, None));
        assert_eq!(out.text(), "");
    }
}
