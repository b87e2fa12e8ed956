use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn keybind(key: &'static str, pad: usize, action: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(key, Style::default().fg(Color::Magenta)),
        Span::raw(" ".repeat(pad)),
        Span::raw(action),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame, base_url: &str) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        keybind("Enter", 7, "Start investigation"),
        keybind("Ctrl-U", 6, "Clear the query"),
        keybind("Ctrl-S", 6, "Save report as JSON"),
        keybind("Ctrl-Y", 6, "Copy id and summary to clipboard"),
        keybind("Tab", 9, "Switch tabs"),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("Esc", Style::default().fg(Color::Magenta)),
            Span::raw(" / "),
            Span::styled("Ctrl-C", Style::default().fg(Color::Magenta)),
            Span::raw("  Quit"),
        ]),
        Line::from(""),
        Line::from("While an investigation is running the query box is locked;"),
        Line::from("it unlocks once the status is COMPLETED or FAILED, or a request fails."),
        Line::from(""),
        Line::from("Service:"),
        Line::from(vec![
            Span::raw("  "),
            Span::styled(base_url.to_string(), Style::default().fg(Color::Cyan)),
        ]),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
