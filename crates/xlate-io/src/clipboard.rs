use std::time::Duration;

use arboard::Clipboard;
use tokio::time;
use tokio_util::sync::CancellationToken;

/// Poll the clipboard and report each new, non-blank text as a selection
pub async fn watch_selection<F>(
    interval: Duration,
    cancel: CancellationToken,
    mut on_text: F,
) -> Result<(), anyhow::Error>
where
    F: FnMut(String) + Send + 'static,
{
    let mut clipboard = Clipboard::new()?;
    let mut selection = SelectionFilter::default();
    let mut interval = time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            _ = interval.tick() => {}
        }

        if let Ok(text) = clipboard.get_text()
            && let Some(text) = selection.accept(&text)
        {
            on_text(text);
        }
    }
}

/// Trims and drops repeats of the last accepted text
#[derive(Default)]
struct SelectionFilter {
    last: String,
}

impl SelectionFilter {
    fn accept(&mut self, raw: &str) -> Option<String> {
        let text = raw.trim();
        if text.is_empty() || text == self.last {
            return None;
        }
        self.last = text.to_string();
        Some(self.last.clone())
    }
}
