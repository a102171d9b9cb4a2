use std::time::Duration;

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Position, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::border,
    text::{Line, Span, Text},
    widgets::{Block, Cell, Clear, Paragraph, Row, Table, TableState, Tabs, Wrap},
};

use crate::countries::LoadState;
use crate::domain::{Screen, TwConfig};
use crate::form::{Delivery, Field};
use crate::login::{LoginField, LoginOutcome};
use crate::model::Model;
use crate::table::SortKey;

pub const TABS_HEIGHT: u16 = 3;
pub const STATUSLINE_HEIGHT: u16 = 1;
pub const INPUT_HEIGHT: u16 = 3;
const POPUP_WIDTH_PERCENT: u32 = 60;
const STATUS_MESSAGE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug)]
pub struct WidgetUI {
    status_timeout: Duration,
}

impl WidgetUI {
    pub fn new(config: &TwConfig) -> Self {
        // Keep messages visible for at least a hundred polls
        let polls = Duration::from_millis(config.event_poll_time * 100);
        Self {
            status_timeout: polls.max(STATUS_MESSAGE_TIMEOUT),
        }
    }

    pub fn draw(&self, model: &Model, frame: &mut Frame) {
        let [tabs_area, body, status_area] = Layout::vertical([
            Constraint::Length(TABS_HEIGHT),
            Constraint::Min(1),
            Constraint::Length(STATUSLINE_HEIGHT),
        ])
        .areas(frame.area());

        self.draw_tabs(model, frame, tabs_area);
        match model.screen() {
            Screen::Table => self.draw_table(model, frame, body),
            Screen::Spell => self.draw_spell(model, frame, body),
            Screen::AlertModal | Screen::InlineModal => self.draw_modal(model, frame, body),
            Screen::Login => self.draw_login(model, frame, body),
            Screen::Weather => self.draw_weather(model, frame, body),
            Screen::Stopwatch => self.draw_stopwatch(model, frame, body),
            Screen::Countries => self.draw_countries(model, frame, body),
        }
        self.draw_statusline(model, frame, status_area);

        if let Some(message) = model.popup_message() {
            self.draw_popup(message, frame);
        }
    }

    fn draw_tabs(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let titles = Screen::ALL
            .iter()
            .enumerate()
            .map(|(idx, s)| format!(" {} {} ", idx + 1, s.label()))
            .collect::<Vec<String>>();
        let tabs = Tabs::new(titles)
            .block(Block::bordered().title(" tw ".bold()))
            .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .select(model.screen().index());
        frame.render_widget(tabs, area);
    }

    fn draw_statusline(&self, model: &Model, frame: &mut Frame, area: Rect) {
        if let Some(filter) = model.table_filter() {
            let prefix = "/";
            frame.render_widget(Paragraph::new(format!("{prefix}{}", filter.value())), area);
            Self::place_cursor(frame, area.x + prefix.len() as u16 + filter.cursor() as u16, area.y);
            return;
        }
        let age = model.last_status_message_update().elapsed();
        let message = if age < self.status_timeout {
            model.status_message()
        } else {
            ""
        };
        let mode = if model.raw_keyevents() { " INPUT " } else { " NAV " };
        let line = Line::from(vec![
            mode.black().on_cyan(),
            " ".into(),
            message.into(),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn draw_popup(&self, message: &str, frame: &mut Frame) {
        let area = frame.area();
        let width = (u32::from(area.width) * POPUP_WIDTH_PERCENT / 100) as u16;
        let height = (message.lines().count() as u16 + 4).min(area.height);
        let popup = Rect {
            x: area.x + (area.width.saturating_sub(width)) / 2,
            y: area.y + (area.height.saturating_sub(height)) / 2,
            width,
            height,
        };
        let block = Block::bordered()
            .title(Line::from(" Notice ".bold()).centered())
            .title_bottom(Line::from(" <Enter>/<Esc> to close ".blue()).centered())
            .border_set(border::THICK);
        frame.render_widget(Clear, popup);
        frame.render_widget(
            Paragraph::new(message)
                .wrap(Wrap { trim: false })
                .block(block),
            popup,
        );
    }

    fn draw_table(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let table = model.table();
        let sorted = match table.sorted_by() {
            Some(SortKey::Date) => " sorted by date ",
            Some(SortKey::Views) => " sorted by views ",
            None => "",
        };
        let filtered = table
            .filter_term()
            .map(|t| format!(" filter \"{t}\" "))
            .unwrap_or_default();

        let header = Row::new(vec!["Date", "Views", "Article"])
            .style(Style::default().add_modifier(Modifier::BOLD).fg(Color::Yellow));
        let rows = table.visible().map(|r| {
            let date = if r.parsed_date().is_some() {
                Cell::from(r.date.clone())
            } else {
                Cell::from(r.date.clone().red())
            };
            Row::new(vec![date, Cell::from(r.views.to_string()), Cell::from(r.article.clone())])
        });
        let instructions = Line::from(vec![
            " Sort by Date ".into(),
            "<d>".blue().bold(),
            " Sort by Views ".into(),
            "<v>".blue().bold(),
            " Filter ".into(),
            "</>".blue().bold(),
            " Copy ".into(),
            "<y> ".blue().bold(),
        ]);
        let widget = Table::new(
            rows,
            [
                Constraint::Length(22),
                Constraint::Length(10),
                Constraint::Min(10),
            ],
        )
        .header(header)
        .block(
            Block::bordered()
                .title(Line::from(format!(" Date and Views Table{sorted}{filtered}").bold()))
                .title_bottom(instructions.centered())
                .border_set(border::THICK),
        )
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));

        let mut state = TableState::default().with_selected(Some(table.cursor_row()));
        frame.render_stateful_widget(widget, area, &mut state);
    }

    fn draw_spell(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let spell = model.spell();
        let [input_area, suggestion_area] =
            Layout::vertical([Constraint::Length(INPUT_HEIGHT), Constraint::Min(1)]).areas(area);

        Self::draw_input(
            frame,
            input_area,
            " Spell Check and Auto-Correction ",
            spell.input.value(),
            model.raw_keyevents().then_some(spell.input.cursor()),
        );

        let text = match spell.suggestion() {
            Some((_, correction)) => Line::from(vec![
                "Did you mean: ".into(),
                correction.as_str().green().bold(),
                "?".into(),
            ]),
            None => Line::from("".dim()),
        };
        frame.render_widget(Paragraph::new(text).block(Block::bordered()), suggestion_area);
    }

    fn draw_modal(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let screen = model.screen();
        let modal = model.form_modal(screen);
        let title = format!(" User Details Modal ({}) ", screen.label());

        if !modal.is_open() {
            let mut lines = vec![Line::from(vec![
                "Press ".into(),
                "<o>".blue().bold(),
                " to open the form".into(),
            ])];
            if let Some(status) = modal.status() {
                lines.push(Line::from(status.green()));
            }
            frame.render_widget(
                Paragraph::new(lines).block(Block::bordered().title(title)),
                area,
            );
            return;
        }

        let inline = modal.policy().delivery == Delivery::AccumulateAllErrors;
        let mut lines = Vec::new();
        let mut cursor = None;
        for field in Field::ALL {
            let focused = modal.focus() == field;
            let marker = if focused { "> " } else { "  " };
            let label = format!("{marker}{:<15}", field.label());
            if focused {
                let x = area.x + 1 + label.chars().count() as u16 + modal.cursor() as u16;
                cursor = Some((x, area.y + 1 + lines.len() as u16));
            }
            let value = modal.form().get(field);
            lines.push(Line::from(vec![
                Span::styled(
                    label,
                    if focused {
                        Style::default().add_modifier(Modifier::BOLD)
                    } else {
                        Style::default()
                    },
                ),
                Span::raw(value.to_string()),
            ]));
            if inline && let Some(error) = modal.errors().get(&field) {
                lines.push(Line::from(format!("   {error}").red()));
            }
        }
        lines.push(Line::from(""));
        if let Some(status) = modal.status() {
            lines.push(Line::from(status.yellow()));
        }

        let hint = Line::from(vec![
            " Next ".into(),
            "<Tab>".blue().bold(),
            " Submit ".into(),
            "<Enter>".blue().bold(),
            " Close ".into(),
            "<Esc> ".blue().bold(),
        ]);
        frame.render_widget(
            Paragraph::new(Text::from(lines)).block(
                Block::bordered()
                    .title(title)
                    .title_bottom(hint.centered())
                    .border_set(border::THICK),
            ),
            area,
        );
        if let Some((x, y)) = cursor {
            Self::place_cursor(frame, x, y);
        }
    }

    fn draw_login(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let login = model.login();
        let block = Block::bordered().title(" Login Page ");

        if let LoginOutcome::Welcome(user) = login.outcome() {
            frame.render_widget(
                Paragraph::new(format!("Welcome, {user}!")).block(block),
                area,
            );
            return;
        }

        let password = login.masked_password();
        let fields = [
            (LoginField::Username, "Username: ", login.username().to_string()),
            (LoginField::Password, "Password: ", password),
        ];
        let mut lines = Vec::new();
        for (row, (field, label, value)) in fields.into_iter().enumerate() {
            let focused = model.raw_keyevents() && login.focus() == field;
            if focused {
                let x = area.x + 1 + label.len() as u16 + login.cursor() as u16;
                Self::place_cursor(frame, x, area.y + 1 + row as u16);
            }
            lines.push(Line::from(vec![label.bold(), value.into()]));
        }
        if let LoginOutcome::Rejected(error) = login.outcome() {
            lines.push(Line::from(error.as_str().red()));
        }
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn draw_weather(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let weather = model.weather();
        let [input_area, cards_area] =
            Layout::vertical([Constraint::Length(INPUT_HEIGHT), Constraint::Min(1)]).areas(area);

        Self::draw_input(
            frame,
            input_area,
            " Enter city name ",
            weather.input.value(),
            model.raw_keyevents().then_some(weather.input.cursor()),
        );

        if weather.is_loading() {
            frame.render_widget(
                Paragraph::new("Loading data...".italic()).block(Block::bordered()),
                cards_area,
            );
            return;
        }
        let Some(snapshot) = weather.visible_snapshot() else {
            return;
        };
        let cards = [
            ("Temperature", format!("{}°C", snapshot.temperature_c)),
            ("Humidity", format!("{}%", snapshot.humidity)),
            ("Condition", snapshot.condition.clone()),
            ("Wind Speed", format!("{} kph", snapshot.wind_kph)),
        ];
        let columns = Layout::horizontal([Constraint::Ratio(1, 4); 4]).split(cards_area);
        for ((title, value), column) in cards.into_iter().zip(columns.iter()) {
            let card = Paragraph::new(value)
                .centered()
                .block(Block::bordered().title(Line::from(title.bold()).centered()));
            frame.render_widget(card, *column);
        }
    }

    fn draw_stopwatch(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let watch = model.stopwatch();
        let (action, state) = if watch.is_running() {
            ("Stop", "running".green())
        } else {
            ("Start", "paused".yellow())
        };
        let text = Text::from(vec![
            Line::from(""),
            Line::from(vec!["Time: ".into(), watch.display().bold()]),
            Line::from(state),
        ]);
        let instructions = Line::from(vec![
            format!(" {action} ").into(),
            "<Space>".blue().bold(),
            " Reset ".into(),
            "<r> ".blue().bold(),
        ]);
        frame.render_widget(
            Paragraph::new(text).centered().block(
                Block::bordered()
                    .title(Line::from(" Stopwatch ".bold()).centered())
                    .title_bottom(instructions.centered())
                    .border_set(border::THICK),
            ),
            area,
        );
    }

    fn draw_countries(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let countries = model.countries();
        let [input_area, grid_area] =
            Layout::vertical([Constraint::Length(INPUT_HEIGHT), Constraint::Min(1)]).areas(area);

        Self::draw_input(
            frame,
            input_area,
            " Search for countries... ",
            countries.input.value(),
            model.raw_keyevents().then_some(countries.input.cursor()),
        );

        let body = match countries.state() {
            LoadState::NotLoaded | LoadState::Loading => {
                Paragraph::new("Loading countries...".italic()).block(Block::bordered())
            }
            LoadState::Failed => Paragraph::new(Line::from(vec![
                "Could not load countries. ".red(),
                "<Enter>".blue().bold(),
                " to retry".into(),
            ]))
            .block(Block::bordered()),
            LoadState::Loaded => {
                let visible = countries.visible();
                let rows = visible
                    .iter()
                    .map(|c| Row::new(vec![c.name.clone(), c.flag.clone()]));
                let title = format!(" {} of {} ", visible.len(), countries.count());
                let table = Table::new(rows, [Constraint::Percentage(30), Constraint::Min(10)])
                    .header(Row::new(vec!["Name", "Flag"]).bold())
                    .block(Block::bordered().title(title));
                frame.render_widget(table, grid_area);
                return;
            }
        };
        frame.render_widget(body, grid_area);
    }

    fn draw_input(frame: &mut Frame, area: Rect, title: &str, value: &str, cursor: Option<usize>) {
        let style = if cursor.is_some() {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };
        frame.render_widget(
            Paragraph::new(value).block(Block::bordered().title(title).border_style(style)),
            area,
        );
        if let Some(pos) = cursor {
            Self::place_cursor(frame, area.x + 1 + pos as u16, area.y + 1);
        }
    }

    fn place_cursor(frame: &mut Frame, x: u16, y: u16) {
        frame.set_cursor_position(Position::new(x, y));
    }
}
