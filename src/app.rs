use ratatui::widgets::ListState;

use crate::config::Config;
use crate::model::AiModel;
use crate::orchestrator::{GenerationClient, Orchestrator};
use crate::prompt::Persona;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Terminal-side application state. The conversation itself lives in the
/// orchestrator; this is input, scrolling, and picker bookkeeping.
pub struct App<C: GenerationClient> {
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Input state
    pub input: String,
    pub cursor: usize, // char index into input

    // Chat view state
    pub chat_scroll: u16,
    pub chat_height: u16, // set during render, used for scroll math
    pub chat_width: u16,  // set during render, used for wrap math
    pub animation_frame: u8, // 0-2 for the typing ellipsis

    // Per-turn request options
    pub active_model: AiModel,
    pub context_enabled: bool,
    pub persona: Persona,
    pub page_context: String,

    // Model picker state
    pub show_model_picker: bool,
    pub model_picker_state: ListState,

    pub orchestrator: Orchestrator<C>,
}

impl<C: GenerationClient> App<C> {
    pub fn new(
        orchestrator: Orchestrator<C>,
        page_context: String,
        active_model: AiModel,
        context_enabled: bool,
        persona: Persona,
    ) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            input: String::new(),
            cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,
            active_model,
            context_enabled,
            persona,
            page_context,
            show_model_picker: false,
            model_picker_state: ListState::default(),
            orchestrator,
        }
    }

    /// Submit the current input as a new turn. No-op while a generation is
    /// in flight or the input is blank.
    pub fn submit(&mut self) {
        let context = self
            .context_enabled
            .then(|| self.page_context.clone());

        let started = self.orchestrator.submit(
            &self.input,
            self.active_model,
            context.as_deref(),
            self.persona,
        );

        if started {
            self.input.clear();
            self.cursor = 0;
            self.scroll_chat_to_bottom();
        }
    }

    pub fn toggle_context(&mut self) {
        self.context_enabled = !self.context_enabled;
    }

    /// Cycle persona: General -> SlangAware -> LocalLens -> General.
    pub fn cycle_persona(&mut self) {
        self.persona = match self.persona {
            Persona::General => Persona::SlangAware,
            Persona::SlangAware => Persona::LocalLens,
            Persona::LocalLens => Persona::General,
        };
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.orchestrator.is_generating() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Chat scrolling
    pub fn scroll_down(&mut self) {
        let max_scroll = self.total_chat_lines().saturating_sub(self.chat_height);
        if self.chat_scroll < max_scroll {
            self.chat_scroll = self.chat_scroll.saturating_add(1);
        }
    }

    pub fn scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn scroll_chat_to_top(&mut self) {
        self.chat_scroll = 0;
    }

    /// Pin the view to the newest content so streamed text stays visible.
    pub fn scroll_chat_to_bottom(&mut self) {
        let total_lines = self.total_chat_lines();

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        if total_lines > visible_height {
            self.chat_scroll = total_lines.saturating_sub(visible_height);
        } else {
            self.chat_scroll = 0;
        }
    }

    /// Estimate rendered chat height: a role line per message, wrapped
    /// content lines, and a blank separator. Mirrors the render layout.
    fn total_chat_lines(&self) -> u16 {
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for msg in self.orchestrator.messages() {
            total_lines += 1; // role/timestamp line
            for line in msg.content.lines() {
                // Character count, not byte length, for UTF-8 content.
                let char_count = line.chars().count();
                if char_count == 0 {
                    total_lines += 1;
                } else {
                    total_lines += ((char_count / wrap_width) + 1) as u16;
                }
            }
            total_lines += 1; // blank line after message
        }

        if self.orchestrator.is_generating() {
            total_lines += 1; // typing indicator
        }

        total_lines
    }

    // Model picker
    pub fn open_model_picker(&mut self) {
        let current_idx = AiModel::all()
            .iter()
            .position(|m| *m == self.active_model)
            .unwrap_or(0);
        self.model_picker_state.select(Some(current_idx));
        self.show_model_picker = true;
    }

    pub fn model_picker_nav_down(&mut self) {
        let len = AiModel::all().len();
        let i = self.model_picker_state.selected().unwrap_or(0);
        self.model_picker_state.select(Some((i + 1).min(len - 1)));
    }

    pub fn model_picker_nav_up(&mut self) {
        let i = self.model_picker_state.selected().unwrap_or(0);
        self.model_picker_state.select(Some(i.saturating_sub(1)));
    }

    pub fn select_model(&mut self) {
        if let Some(i) = self.model_picker_state.selected() {
            if let Some(&model) = AiModel::all().get(i) {
                self.active_model = model;
                self.show_model_picker = false;
                let _ = Config::save_default_model(model);
            }
        }
    }
}
