use std::sync::Arc;
use std::time::Instant;

use arboard::Clipboard;
use chrono::{Local, NaiveDate};
use crossbeam_channel::{Receiver, unbounded};
use ratatui::crossterm::event::KeyEvent;
use tracing::{debug, info, trace, warn};

use crate::countries::{CountryGrid, LoadState};
use crate::domain::{HELP_TEXT, Message, Screen, TwConfig, TwError};
use crate::form::{FormModal, SubmitOutcome};
use crate::inputter::{InputResult, Inputter};
use crate::login::{LoginForm, LoginOutcome};
use crate::remote::{Dispatcher, RemoteSource};
use crate::spell::SpellChecker;
use crate::stopwatch::Stopwatch;
use crate::table::{SortableTable, default_records};
use crate::weather::WeatherWidget;

// Rows taken by tabs, table header, borders and status line
const TABLE_CHROME_HEIGHT: usize = 7;

#[derive(Debug, PartialEq)]
pub enum Status {
    Ready,
    Quitting,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    Normal,
    Input,
    Popup,
}

pub struct Model {
    pub status: Status,
    screen: Screen,
    modus: Modus,
    previous_modus: Modus,
    table: SortableTable,
    table_filter: Inputter,
    spell: SpellChecker,
    alert_modal: FormModal,
    inline_modal: FormModal,
    login: LoginForm,
    weather: WeatherWidget,
    stopwatch: Stopwatch,
    countries: CountryGrid,
    dispatcher: Dispatcher,
    results: Receiver<Message>,
    clipboard: Option<Clipboard>,
    popup_message: Option<String>,
    status_message: String,
    last_status_message_update: Instant,
    ui_height: usize,
}

impl Model {
    pub fn init(config: &TwConfig, source: Arc<dyn RemoteSource>) -> Result<Self, TwError> {
        let table = match &config.records {
            Some(path) => SortableTable::load(path)?,
            None => SortableTable::new(default_records()),
        };
        let (tx, results) = unbounded();

        let mut model = Self {
            status: Status::Ready,
            screen: Screen::Table,
            modus: Modus::Normal,
            previous_modus: Modus::Normal,
            table,
            table_filter: Inputter::default(),
            spell: SpellChecker::new(config.dictionary.clone()),
            alert_modal: FormModal::new(config.alert_policy),
            inline_modal: FormModal::new(config.inline_policy),
            login: LoginForm::new(config.credentials.clone()),
            weather: WeatherWidget::default(),
            stopwatch: Stopwatch::default(),
            countries: CountryGrid::default(),
            dispatcher: Dispatcher::new(source, tx),
            results,
            clipboard: None,
            popup_message: None,
            status_message: String::new(),
            last_status_message_update: Instant::now(),
            ui_height: 0,
        };
        model.set_status_message("Started tw! Press ? for help.");
        Ok(model)
    }

    pub fn update(&mut self, message: Option<Message>) -> Result<(), TwError> {
        self.stopwatch.advance(Instant::now());
        self.drain_results();

        if let Some(msg) = message {
            match self.modus {
                Modus::Popup => match msg {
                    Message::Quit => self.quit(),
                    Message::Exit | Message::Enter => self.close_popup(),
                    Message::Resize(width, height) => self.ui_resize(width, height),
                    other => self.apply_loaded(other),
                },
                Modus::Input => match msg {
                    Message::Quit => self.quit(),
                    Message::RawKey(key) => self.raw_input(key),
                    Message::Resize(width, height) => self.ui_resize(width, height),
                    other => self.apply_loaded(other),
                },
                Modus::Normal => match msg {
                    Message::Quit => self.quit(),
                    Message::Help => self.show_popup(HELP_TEXT),
                    Message::NextScreen => self.goto(self.screen.next()),
                    Message::PrevScreen => self.goto(self.screen.prev()),
                    Message::Goto(screen) => self.goto(screen),
                    Message::Resize(width, height) => self.ui_resize(width, height),
                    Message::Tick | Message::Exit => {}
                    Message::WeatherLoaded(..) | Message::CountriesLoaded(..) => {
                        self.apply_loaded(msg)
                    }
                    other => self.screen_message(other),
                },
            }
        }
        Ok(())
    }

    fn screen_message(&mut self, msg: Message) {
        let page = self.table_page();
        match self.screen {
            Screen::Table => match msg {
                Message::MoveUp => self.table.move_up(1),
                Message::MoveDown => self.table.move_down(1),
                Message::MovePageUp => self.table.move_up(page),
                Message::MovePageDown => self.table.move_down(page),
                Message::MoveBeginning => self.table.move_beginning(),
                Message::MoveEnd => self.table.move_end(),
                Message::SortByDate => {
                    self.table.sort_by_date();
                    self.set_status_message("Sorted by date, then views");
                }
                Message::SortByViews => {
                    self.table.sort_by_views();
                    self.set_status_message("Sorted by views, then date");
                }
                Message::Filter | Message::Focus => {
                    self.table_filter.set(self.table.filter_term().unwrap_or(""));
                    self.enter_input();
                }
                Message::CopyRow => self.copy_table_row(),
                _ => (),
            },
            Screen::AlertModal | Screen::InlineModal => {
                if matches!(msg, Message::OpenModal | Message::Enter | Message::Focus) {
                    self.modal_mut().open();
                    self.enter_input();
                }
            }
            Screen::Stopwatch => match msg {
                Message::ToggleStopwatch | Message::Enter => self.stopwatch.toggle(Instant::now()),
                Message::ResetStopwatch => self.stopwatch.reset(),
                _ => (),
            },
            Screen::Login => {
                if matches!(msg, Message::Focus | Message::Enter) {
                    if matches!(self.login.outcome(), LoginOutcome::Welcome(_)) {
                        self.login.logout();
                    }
                    self.enter_input();
                }
            }
            Screen::Countries => match msg {
                Message::Enter if self.countries.state() == LoadState::Failed => {
                    self.load_countries()
                }
                Message::Focus | Message::Enter => self.enter_input(),
                _ => (),
            },
            Screen::Spell | Screen::Weather => {
                if matches!(msg, Message::Focus | Message::Enter) {
                    self.enter_input();
                }
            }
        }
    }

    fn raw_input(&mut self, key: KeyEvent) {
        match self.screen {
            Screen::Table => {
                let result = self.table_filter.read(key);
                if result.finished {
                    if !result.canceled {
                        self.table.filter(&result.input);
                        let shown = self.table.visible_len();
                        self.set_status_message(format!("Showing {shown} rows"));
                    }
                    self.leave_input();
                }
            }
            Screen::Spell => {
                let result = self.spell.input.read(key);
                if result.changed {
                    self.spell.refresh();
                }
                self.leave_input_when_finished(&result);
            }
            Screen::AlertModal | Screen::InlineModal => {
                let today = Self::today();
                let outcome = self.modal_mut().handle_key(key, today);
                match outcome {
                    SubmitOutcome::Alert(message) => self.show_popup(&message),
                    SubmitOutcome::Inline(count) => {
                        debug!("Inline modal shows {count} errors");
                        let status = self.modal().status().unwrap_or_default().to_string();
                        self.set_status_message(status);
                    }
                    SubmitOutcome::Accepted(form) => {
                        info!("Form accepted for {}", form.username);
                        self.set_status_message(format!("Form submitted for {}", form.username));
                    }
                    SubmitOutcome::Ignored => {}
                }
                if !self.modal().is_open() {
                    self.leave_input();
                }
            }
            Screen::Login => {
                let left = self.login.handle_key(key);
                let welcomed = matches!(self.login.outcome(), LoginOutcome::Welcome(_));
                if left || welcomed {
                    self.leave_input();
                }
            }
            Screen::Weather => {
                let result = self.weather.input.read(key);
                if result.finished && !result.canceled {
                    self.search_weather();
                }
                self.leave_input_when_finished(&result);
            }
            Screen::Countries => {
                let result = self.countries.input.read(key);
                self.leave_input_when_finished(&result);
            }
            Screen::Stopwatch => self.leave_input(),
        }
    }

    fn search_weather(&mut self) {
        match self.weather.search() {
            Some((seq, city)) => {
                self.set_status_message(format!("Looking up weather for {city} ..."));
                self.dispatcher.weather(seq, city);
            }
            None => self.set_status_message("Please enter a city"),
        }
    }

    fn drain_results(&mut self) {
        let finished: Vec<Message> = self.results.try_iter().collect();
        for msg in finished {
            self.apply_loaded(msg);
        }
    }

    fn apply_loaded(&mut self, msg: Message) {
        match msg {
            Message::WeatherLoaded(seq, result) => match self.weather.finish(seq, result) {
                Some(Ok(())) => {
                    let city = self.weather.last_city().unwrap_or_default().to_string();
                    self.set_status_message(format!("Weather for {city}"));
                }
                Some(Err(notice)) => self.show_popup(notice),
                None => {}
            },
            Message::CountriesLoaded(seq, result) => {
                match self.countries.finish(seq, result) {
                    Some(notice) => self.set_status_message(notice),
                    None => {
                        let count = self.countries.count();
                        self.set_status_message(format!("Loaded {count} countries"));
                    }
                }
            }
            other => trace!("Ignoring {other:?} in {:?}", self.modus),
        }
    }

    fn goto(&mut self, screen: Screen) {
        trace!("Switching screen {:?} -> {:?}", self.screen, screen);
        self.screen = screen;
        if screen == Screen::Countries {
            self.load_countries();
        }
    }

    fn load_countries(&mut self) {
        if let Some(seq) = self.countries.mount() {
            self.set_status_message("Loading countries ...");
            self.dispatcher.countries(seq);
        }
    }

    fn enter_input(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::Input;
    }

    fn leave_input(&mut self) {
        self.previous_modus = Modus::Input;
        self.modus = Modus::Normal;
    }

    fn leave_input_when_finished(&mut self, result: &InputResult) {
        if result.finished {
            self.leave_input();
        }
    }

    fn show_popup(&mut self, message: &str) {
        if self.modus != Modus::Popup {
            self.previous_modus = self.modus;
        }
        self.modus = Modus::Popup;
        self.popup_message = Some(message.to_string());
    }

    fn close_popup(&mut self) {
        trace!("Close popup ...");
        self.modus = self.previous_modus;
        self.previous_modus = Modus::Popup;
        self.popup_message = None;
    }

    fn copy_table_row(&mut self) {
        let Some(row) = self.table.selected().map(|r| r.as_csv()) else {
            return;
        };
        trace!("Row content: {row}");
        match self
            .clipboard()
            .and_then(|clipboard| clipboard.set_text(row).map_err(TwError::from))
        {
            Ok(_) => self.set_status_message("Copied row to clipboard"),
            Err(e) => {
                warn!("Error copying to clipboard: {e}");
                self.set_status_message(e.to_string());
            }
        }
    }

    // Created on first use, not every terminal has a clipboard
    fn clipboard(&mut self) -> Result<&mut Clipboard, TwError> {
        if self.clipboard.is_none() {
            self.clipboard = Some(Clipboard::new()?);
        }
        self.clipboard
            .as_mut()
            .ok_or_else(|| TwError::LoadingFailed("clipboard unavailable".into()))
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.last_status_message_update = Instant::now();
    }

    fn ui_resize(&mut self, width: usize, height: usize) {
        trace!("UI was resized! w:{width}, h:{}->{}", self.ui_height, height);
        self.ui_height = height;
    }

    fn table_page(&self) -> usize {
        self.ui_height.saturating_sub(TABLE_CHROME_HEIGHT).max(1)
    }

    fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    fn modal(&self) -> &FormModal {
        match self.screen {
            Screen::InlineModal => &self.inline_modal,
            _ => &self.alert_modal,
        }
    }

    fn modal_mut(&mut self) -> &mut FormModal {
        match self.screen {
            Screen::InlineModal => &mut self.inline_modal,
            _ => &mut self.alert_modal,
        }
    }

    pub fn quit(&mut self) {
        self.stopwatch.stop();
        self.status = Status::Quitting;
    }

    // -------------------- Accessors for rendering ---------------------- //

    pub fn raw_keyevents(&self) -> bool {
        self.modus == Modus::Input
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn popup_message(&self) -> Option<&str> {
        self.popup_message.as_deref()
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn last_status_message_update(&self) -> Instant {
        self.last_status_message_update
    }

    pub fn table(&self) -> &SortableTable {
        &self.table
    }

    /// The filter being typed, if the table filter has focus.
    pub fn table_filter(&self) -> Option<&Inputter> {
        (self.screen == Screen::Table && self.raw_keyevents()).then_some(&self.table_filter)
    }

    pub fn spell(&self) -> &SpellChecker {
        &self.spell
    }

    pub fn form_modal(&self, screen: Screen) -> &FormModal {
        match screen {
            Screen::InlineModal => &self.inline_modal,
            _ => &self.alert_modal,
        }
    }

    pub fn login(&self) -> &LoginForm {
        &self.login
    }

    pub fn weather(&self) -> &WeatherWidget {
        &self.weather
    }

    pub fn stopwatch(&self) -> &Stopwatch {
        &self.stopwatch
    }

    pub fn countries(&self) -> &CountryGrid {
        &self.countries
    }
}
