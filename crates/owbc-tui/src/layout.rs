//! Screen layout definitions for the TUI

use ratatui::layout::{Constraint, Layout, Rect};

/// Screen areas for the main layout
#[derive(Debug, Clone, Copy)]
pub struct ScreenAreas {
    /// Tab bar with the view titles
    pub header: Rect,

    /// Active view content
    pub content: Rect,

    /// Key hints plus the active pane's notice or error
    pub status: Rect,
}

/// Split the screen into header, content and status areas.
pub fn create(area: Rect) -> ScreenAreas {
    let chunks = Layout::vertical([
        Constraint::Length(3), // Header (bordered tab bar)
        Constraint::Min(3),    // Content
        Constraint::Length(2), // Status: notice/error line + key hints
    ])
    .split(area);

    ScreenAreas {
        header: chunks[0],
        content: chunks[1],
        status: chunks[2],
    }
}
