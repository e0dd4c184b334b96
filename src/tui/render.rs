//! Draws the mounted dialog of a [`Document`] with ratatui

use super::theme::Palette;
use super::Frame;
use crate::dom::{Document, ElementId};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use unicode_width::UnicodeWidthChar;

const SPINNER_FRAMES: [&str; 8] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧"];

/// Screen regions of the last drawn dialog, for mouse hit testing
#[derive(Debug, Clone, Default)]
pub struct HitMap {
    dialog: Option<Rect>,
    targets: Vec<(Rect, ElementId)>,
}

/// What a mouse press at a position means
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    Element(ElementId),
    Overlay,
    Inside,
}

impl HitMap {
    pub fn hit(&self, column: u16, row: u16) -> Option<Hit> {
        let dialog = self.dialog?;
        if let Some((_, element)) = self
            .targets
            .iter()
            .find(|(rect, _)| contains(*rect, column, row))
        {
            return Some(Hit::Element(*element));
        }
        if contains(dialog, column, row) {
            Some(Hit::Inside)
        } else {
            Some(Hit::Overlay)
        }
    }
}

fn contains(rect: Rect, column: u16, row: u16) -> bool {
    column >= rect.x && column < rect.x + rect.width && row >= rect.y && row < rect.y + rect.height
}

struct ButtonView {
    element: ElementId,
    label: String,
    busy: bool,
    spinner: Option<String>,
    disabled: bool,
    focused: bool,
    primary: bool,
}

struct InputView {
    element: ElementId,
    value: String,
    focused: bool,
    invalid: bool,
}

/// Extracted content of one dialog
struct DialogContent {
    title: Option<String>,
    icon: Option<String>,
    paragraphs: Vec<String>,
    keyword_label: Option<String>,
    input: Option<InputView>,
    buttons: Vec<ButtonView>,
    status: Option<String>,
}

fn is_hidden<D: Document + ?Sized>(doc: &D, element: ElementId) -> bool {
    doc.has_attribute(element, "hidden")
}

fn button_view<D: Document + ?Sized>(doc: &D, element: ElementId, focused: Option<ElementId>) -> ButtonView {
    let mut label = doc.text(element).unwrap_or_default().to_string();
    let mut busy = false;
    let mut spinner = None;

    for child in doc.descendants(element) {
        if doc.has_attribute(child, "data-affirm-spinner") {
            if !is_hidden(doc, child) {
                busy = true;
                spinner = doc.text(child).filter(|text| !text.is_empty()).map(str::to_string);
            }
            continue;
        }
        if let Some(text) = doc.text(child) {
            label.push_str(text);
        }
    }

    ButtonView {
        element,
        label,
        busy,
        spinner,
        disabled: doc.has_attribute(element, "disabled"),
        focused: focused == Some(element),
        primary: doc.has_attribute(element, "data-affirm-confirm"),
    }
}

fn extract<D: Document + ?Sized>(doc: &D, dialog: ElementId) -> DialogContent {
    let focused = doc.active_element();
    let mut content = DialogContent {
        title: None,
        icon: None,
        paragraphs: Vec::new(),
        keyword_label: None,
        input: None,
        buttons: Vec::new(),
        status: None,
    };

    let mut inside_button: Vec<ElementId> = Vec::new();
    for element in doc.descendants(dialog) {
        if inside_button.iter().any(|button| doc.contains(*button, element)) {
            continue;
        }
        let text = doc.text(element).unwrap_or_default();

        if doc.has_attribute(element, "data-affirm-title") {
            content.title = Some(text.to_string());
        } else if doc.has_attribute(element, "data-affirm-icon") {
            content.icon = Some(text.to_string());
        } else if doc.has_attribute(element, "data-affirm-keyword-label") {
            content.keyword_label = Some(text.to_string());
        } else if doc.attribute(element, "role") == Some("status") {
            if !is_hidden(doc, element) && !text.is_empty() {
                content.status = Some(text.to_string());
            }
        } else if doc.tag(element) == Some("button") {
            inside_button.push(element);
            content.buttons.push(button_view(doc, element, focused));
        } else if doc.tag(element) == Some("input") {
            content.input = Some(InputView {
                element,
                value: doc.attribute(element, "value").unwrap_or_default().to_string(),
                focused: focused == Some(element),
                invalid: doc.attribute(element, "aria-invalid") == Some("true"),
            });
        } else if !text.is_empty() && !is_hidden(doc, element) {
            content.paragraphs.push(text.to_string());
        }
    }

    content
}

/// Find the mounted dialog: the last `data-affirm` root under the body
fn mounted_dialog<D: Document + ?Sized>(doc: &D) -> Option<(ElementId, ElementId)> {
    let body = doc.body();
    let root = doc
        .children(body)
        .into_iter()
        .rev()
        .find(|element| doc.has_attribute(*element, "data-affirm"))?;
    let dialog = doc.find_by_attribute(root, "data-affirm-dialog")?;
    Some((root, dialog))
}

fn dialog_width(size: Option<&str>, area: Rect) -> u16 {
    let width = match size {
        Some("sm") => 40,
        Some("lg") => 72,
        Some("xl") => 90,
        Some("full") => area.width.saturating_sub(4),
        _ => 56,
    };
    width.min(area.width)
}

/// Rows `text` takes when wrapped to `width`, saturating at `u16::MAX`
fn wrapped_height(text: &str, width: u16) -> u16 {
    let lines = textwrap::wrap(text, width.max(1) as usize).len().max(1);
    u16::try_from(lines).unwrap_or(u16::MAX)
}

/// Tail of `value` that fits in `width` columns
fn visible_tail(value: &str, width: usize) -> &str {
    let mut used = 0;
    let mut start = value.len();
    for (index, c) in value.char_indices().rev() {
        used += UnicodeWidthChar::width(c).unwrap_or(0);
        if used > width {
            break;
        }
        start = index;
    }
    &value[start..]
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}

/// Draw the mounted dialog, if any. `tick` animates busy spinners.
pub fn draw<D: Document + ?Sized>(frame: &mut Frame, doc: &D, tick: usize) -> HitMap {
    let area = frame.size();
    let Some((root, dialog)) = mounted_dialog(doc) else {
        return HitMap::default();
    };

    let palette = if doc.attribute(root, "data-unstyled").is_some() {
        Palette::unstyled()
    } else if doc.attribute(root, "class") == Some("dark") {
        Palette::dark()
    } else {
        Palette::light()
    };
    let accent = palette.accent(doc.attribute(dialog, "data-variant"));
    let settled = doc.attribute(dialog, "data-state") == Some("open");
    let alignment = match (
        doc.attribute(dialog, "data-layout"),
        doc.attribute(root, "dir"),
    ) {
        (Some("centered"), _) => Alignment::Center,
        (_, Some("rtl")) => Alignment::Right,
        _ => Alignment::Left,
    };

    let content = extract(doc, dialog);
    let width = dialog_width(doc.attribute(dialog, "data-size"), area);
    let inner_width = width.saturating_sub(4);

    let header_height = u16::from(content.title.is_some());
    let body_height: u16 = content
        .paragraphs
        .iter()
        .map(|text| wrapped_height(text, inner_width))
        .fold(0, u16::saturating_add);
    let keyword_height = if content.input.is_some() {
        u16::from(content.keyword_label.is_some()) + 3
    } else {
        0
    };
    let buttons_height = if content.buttons.is_empty() { 0 } else { 3 };
    let status_height = u16::from(content.status.is_some());
    let height = [header_height, body_height, keyword_height, buttons_height, status_height, 4]
        .into_iter()
        .fold(0, u16::saturating_add);

    let rect = centered(area, width, height);
    frame.render_widget(Clear, rect);

    let mut block_style = palette.base_style();
    if !settled {
        block_style = block_style.add_modifier(Modifier::DIM);
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent))
        .style(block_style);
    let inner = block.inner(rect);
    frame.render_widget(block, rect);

    let inner = Rect {
        x: inner.x + 1,
        width: inner.width.saturating_sub(2),
        y: inner.y + 1,
        height: inner.height.saturating_sub(1),
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(header_height),
            Constraint::Length(body_height),
            Constraint::Length(keyword_height),
            Constraint::Length(buttons_height),
            Constraint::Length(status_height),
            Constraint::Min(0),
        ])
        .split(inner);

    if let Some(title) = &content.title {
        let mut spans = Vec::new();
        if let Some(icon) = &content.icon {
            spans.push(Span::styled(format!("{} ", icon), Style::default().fg(accent)));
        }
        spans.push(Span::styled(
            title.clone(),
            Style::default().fg(palette.text).add_modifier(Modifier::BOLD),
        ));
        frame.render_widget(
            Paragraph::new(Line::from(spans)).alignment(alignment),
            chunks[0],
        );
    }

    if !content.paragraphs.is_empty() {
        let lines: Vec<Line> = content
            .paragraphs
            .iter()
            .map(|text| Line::from(Span::styled(text.clone(), Style::default().fg(palette.text_dim))))
            .collect();
        frame.render_widget(
            Paragraph::new(lines)
                .alignment(alignment)
                .wrap(Wrap { trim: true }),
            chunks[1],
        );
    }

    let mut hits = HitMap {
        dialog: Some(rect),
        targets: Vec::new(),
    };

    if let Some(input) = &content.input {
        let input_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(u16::from(content.keyword_label.is_some())),
                Constraint::Length(3),
            ])
            .split(chunks[2]);
        if let Some(label) = &content.keyword_label {
            frame.render_widget(
                Paragraph::new(label.clone()).style(Style::default().fg(palette.text_dim)),
                input_chunks[0],
            );
        }
        let border = if input.invalid && !input.value.is_empty() {
            palette.danger
        } else if input.focused {
            accent
        } else {
            palette.border
        };
        let cursor = if input.focused { "▏" } else { "" };
        let room = input_chunks[1].width.saturating_sub(3) as usize;
        frame.render_widget(
            Paragraph::new(format!("{}{}", visible_tail(&input.value, room), cursor)).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(border)),
            ),
            input_chunks[1],
        );
        hits.targets.push((input_chunks[1], input.element));
    }

    if !content.buttons.is_empty() {
        let count = content.buttons.len() as u32;
        let constraints: Vec<Constraint> = content
            .buttons
            .iter()
            .map(|_| Constraint::Ratio(1, count))
            .collect();
        let button_areas = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(constraints)
            .split(chunks[3]);

        for (button, button_area) in content.buttons.iter().zip(button_areas.iter()) {
            let label = if button.busy {
                let glyph = button
                    .spinner
                    .clone()
                    .unwrap_or_else(|| SPINNER_FRAMES[tick % SPINNER_FRAMES.len()].to_string());
                format!(" {} ", glyph)
            } else {
                format!(" {} ", button.label)
            };
            let color = if button.primary { accent } else { palette.primary };
            frame.render_widget(
                Paragraph::new(label)
                    .style(palette.button_style(color, button.focused, button.disabled))
                    .alignment(Alignment::Center)
                    .block(Block::default().borders(Borders::ALL)),
                *button_area,
            );
            hits.targets.push((*button_area, button.element));
        }
    }

    if let Some(status) = &content.status {
        frame.render_widget(
            Paragraph::new(status.clone())
                .style(Style::default().fg(palette.text_dim))
                .alignment(alignment),
            chunks[4],
        );
    }

    hits
}
