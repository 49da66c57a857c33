//! Byte-level progress reporting for downloads.

/// Receives the progress of one download.
pub trait Progress {
    /// Called once the response headers arrived. `total` is [`None`] if the size is unknown.
    fn start(&mut self, total: Option<u64>);

    /// Called after every chunk written.
    fn advance(&mut self, bytes: u64);

    /// Called once the body has been written completely.
    fn finish(&mut self);

    /// Called if the download is abandoned.
    fn abandon(&mut self) {}
}

/// Reports nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Progress for Silent {
    fn start(&mut self, _: Option<u64>) {}

    fn advance(&mut self, _: u64) {}

    fn finish(&mut self) {}
}

#[cfg(feature = "progress")]
pub use bar::Bar;

#[cfg(feature = "progress")]
mod bar {
    use super::Progress;

    use indicatif::{ProgressBar, ProgressStyle};

    const BAR_TEMPLATE: &str =
        "{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";
    const SPINNER_TEMPLATE: &str = "{spinner:.green} {msg} {bytes} ({bytes_per_sec})";

    /// Draws an `indicatif` progress bar on stderr, or a byte counter if the size is unknown.
    #[derive(Debug)]
    pub struct Bar {
        message: String,
        bar: Option<ProgressBar>,
    }

    impl Bar {
        /// Creates a [`Bar`] labelled with `message`, usually the destination path.
        pub fn new<S>(message: S) -> Self
        where
            S: Into<String>,
        {
            Self {
                message: message.into(),
                bar: None,
            }
        }
    }

    impl Progress for Bar {
        fn start(&mut self, total: Option<u64>) {
            let bar = match total {
                Some(total) => ProgressBar::new(total).with_style(
                    ProgressStyle::with_template(BAR_TEMPLATE)
                        .unwrap_or_else(|_| ProgressStyle::default_bar())
                        .progress_chars("#>-"),
                ),
                None => ProgressBar::new_spinner().with_style(
                    ProgressStyle::with_template(SPINNER_TEMPLATE)
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                ),
            };
            bar.set_message(self.message.clone());
            self.bar = Some(bar);
        }

        fn advance(&mut self, bytes: u64) {
            if let Some(bar) = &self.bar {
                bar.inc(bytes);
            }
        }

        fn finish(&mut self) {
            if let Some(bar) = self.bar.take() {
                bar.finish();
            }
        }

        fn abandon(&mut self) {
            if let Some(bar) = self.bar.take() {
                bar.abandon();
            }
        }
    }
}
