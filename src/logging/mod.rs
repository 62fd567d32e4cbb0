use crate::config::EnvConfig;

/// Installs the global `tracing` subscriber. In the browser every event is
/// written to the devtools console at the matching level. A second call is
/// a no-op.
pub(crate) fn init_logging(cfg: &EnvConfig) {
    let builder = tracing_subscriber::fmt()
        .with_max_level(cfg.level_filter())
        .with_target(false)
        .with_ansi(false)
        .without_time();

    #[cfg(target_arch = "wasm32")]
    let result = builder.with_writer(console::ConsoleMakeWriter).try_init();
    #[cfg(not(target_arch = "wasm32"))]
    let result = builder.with_writer(std::io::stderr).try_init();

    if result.is_err() {
        tracing::debug!("log subscriber already installed");
    }
}

#[cfg(target_arch = "wasm32")]
mod console {
    use tracing::{Level, Metadata};
    use tracing_subscriber::fmt::MakeWriter;

    pub(crate) struct ConsoleMakeWriter;

    /// Collects one formatted event and hands it to the console on drop.
    pub(crate) struct ConsoleWriter {
        level: Level,
        buf: Vec<u8>,
    }

    impl std::io::Write for ConsoleWriter {
        fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
            self.buf.extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Drop for ConsoleWriter {
        fn drop(&mut self) {
            let text = String::from_utf8_lossy(&self.buf);
            let line = text.trim_end();
            if line.is_empty() {
                return;
            }
            let msg = wasm_bindgen::JsValue::from_str(line);
            match self.level {
                Level::ERROR => web_sys::console::error_1(&msg),
                Level::WARN => web_sys::console::warn_1(&msg),
                Level::INFO => web_sys::console::info_1(&msg),
                _ => web_sys::console::debug_1(&msg),
            }
        }
    }

    impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
        type Writer = ConsoleWriter;

        fn make_writer(&'a self) -> Self::Writer {
            ConsoleWriter {
                level: Level::INFO,
                buf: Vec::new(),
            }
        }

        fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
            ConsoleWriter {
                level: *meta.level(),
                buf: Vec::new(),
            }
        }
    }
}
