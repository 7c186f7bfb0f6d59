//! Main application state and event loop

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::{
    chat::{self, ChatClient},
    conversation::{Conversation, Role},
    input_utils,
    speech::{self, Speaker},
    ui::{self, InputMode, RenderState},
    voice::Recorder,
};

/// Messages that can be sent to the app from various sources
#[derive(Debug)]
pub enum AppMessage {
    /// Final transcript for one recording; None when nothing was recognized
    Transcript(Option<String>),
    /// Recording or transcription failure
    VoiceError(String),
    /// Assistant reply for the turn in flight, tagged with the session
    /// that started it
    Reply { text: String, session: u64 },
    /// Chat request failure, tagged like `Reply`
    ChatError { error: String, session: u64 },
    /// Speech synthesis failure (the reply is already on screen)
    SpeechError(String),
}

/// Startup options from the CLI
pub struct Options {
    pub model: String,
    pub endpoint: String,
    pub voice: String,
    pub language: String,
    pub muted: bool,
}

/// Application state
pub struct App {
    /// Terminal handle
    terminal: Terminal<CrosstermBackend<Stdout>>,
    /// Current chat model
    model: String,
    /// TTS voice, shared selection with the language below
    voice: String,
    /// Recognition language hint
    language: String,
    /// Speech output muted
    muted: bool,
    /// The ordered message sequence sent to the chat API
    conversation: Conversation,
    /// Current input text
    input: String,
    /// Input cursor position
    cursor_position: usize,
    /// Input mode (normal, recording)
    input_mode: InputMode,
    /// Is a chat request in flight?
    busy: bool,
    /// Error from the last failed turn, shown inline in the transcript
    last_error: Option<String>,
    /// Chat completion client
    chat_client: ChatClient,
    /// API credential, shared by chat, Whisper and TTS
    api_key: String,
    /// Voice recorder
    recorder: Recorder,
    /// Speech output
    speaker: Speaker,
    /// App message receiver
    message_rx: mpsc::Receiver<AppMessage>,
    /// App message sender (shared)
    message_tx: mpsc::Sender<AppMessage>,
    /// Scroll offset for the transcript view
    scroll_offset: usize,
    /// Input history
    input_history: Vec<String>,
    /// Current position in input history
    history_index: Option<usize>,
    /// Should quit
    should_quit: bool,
    /// Transient status message
    status_message: Option<String>,
}

impl App {
    pub fn new(options: Options) -> Result<Self> {
        let api_key = chat::api_key()?;

        // Set up terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        // Create message channel
        let (message_tx, message_rx) = mpsc::channel(100);

        // Initialize components
        let chat_client = ChatClient::new(options.endpoint, api_key.clone());
        let recorder = Recorder::new(message_tx.clone(), api_key.clone());
        let speaker = Speaker::new();

        Ok(Self {
            terminal,
            model: options.model,
            voice: options.voice,
            language: options.language,
            muted: options.muted,
            conversation: Conversation::new(),
            input: String::new(),
            cursor_position: 0,
            input_mode: InputMode::Normal,
            busy: false,
            last_error: None,
            chat_client,
            api_key,
            recorder,
            speaker,
            message_rx,
            message_tx,
            scroll_offset: 0,
            input_history: Vec::new(),
            history_index: None,
            should_quit: false,
            status_message: Some("Describe a situation to practice, or /help".to_string()),
        })
    }

    /// Main event loop
    pub async fn run(&mut self) -> Result<()> {
        loop {
            // Draw UI
            self.draw()?;

            // Handle events with timeout
            tokio::select! {
                // Check for terminal events
                _ = tokio::time::sleep(Duration::from_millis(16)) => {
                    if event::poll(Duration::from_millis(0))? {
                        if let Event::Key(key) = event::read()? {
                            self.handle_key_event(key).await?;
                        }
                    }
                }

                // Check for app messages
                Some(msg) = self.message_rx.recv() => {
                    self.handle_app_message(msg).await?;
                }
            }

            if self.should_quit {
                break;
            }
        }

        // Cleanup
        self.cleanup()?;
        Ok(())
    }

    fn draw(&mut self) -> Result<()> {
        // Extract state for rendering
        let state = RenderState {
            messages: self.conversation.messages(),
            input: &self.input,
            cursor_position: self.cursor_position,
            input_mode: self.input_mode,
            busy: self.busy,
            model: &self.model,
            language: &self.language,
            voice: &self.voice,
            muted: self.muted,
            scroll_offset: self.scroll_offset,
            status_message: self.status_message.as_deref(),
            last_error: self.last_error.as_deref(),
        };

        self.terminal.draw(|frame| {
            ui::draw(frame, &state);
        })?;
        Ok(())
    }

    async fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        match self.input_mode {
            InputMode::Normal => self.handle_normal_mode_key(key).await?,
            InputMode::Recording => self.handle_recording_mode_key(key).await?,
        }
        Ok(())
    }

    async fn handle_normal_mode_key(&mut self, key: KeyEvent) -> Result<()> {
        match (key.modifiers, key.code) {
            // Quit
            (KeyModifiers::CONTROL, KeyCode::Char('q')) => {
                self.should_quit = true;
            }
            (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
                // Clear input (an in-flight request cannot be aborted)
                self.input.clear();
                self.cursor_position = 0;
            }
            // Submit input
            (_, KeyCode::Enter) => {
                if !self.input.is_empty() {
                    self.submit_input().await?;
                }
            }
            // Voice toggle
            (_, KeyCode::Char('*')) if !key.modifiers.contains(KeyModifiers::SHIFT) => {
                self.toggle_recording().await?;
            }
            // Character input (cursor_position is a char index)
            (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(c)) => {
                input_utils::insert_char(&mut self.input, self.cursor_position, c);
                self.cursor_position += 1;
            }
            // Backspace
            (_, KeyCode::Backspace) => {
                if self.cursor_position > 0 {
                    self.cursor_position -= 1;
                    input_utils::remove_char(&mut self.input, self.cursor_position);
                }
            }
            // Delete
            (_, KeyCode::Delete) => {
                input_utils::remove_char(&mut self.input, self.cursor_position);
            }
            // Cursor movement
            (_, KeyCode::Left) => {
                if self.cursor_position > 0 {
                    self.cursor_position -= 1;
                }
            }
            (_, KeyCode::Right) => {
                if self.cursor_position < self.input.chars().count() {
                    self.cursor_position += 1;
                }
            }
            (_, KeyCode::Home) => {
                self.cursor_position = 0;
            }
            (_, KeyCode::End) => {
                self.cursor_position = self.input.chars().count();
            }
            // History navigation
            (_, KeyCode::Up) => {
                self.navigate_history(-1);
            }
            (_, KeyCode::Down) => {
                self.navigate_history(1);
            }
            // Scroll transcript
            (_, KeyCode::PageUp) => {
                self.scroll_offset = self.scroll_offset.saturating_add(10);
            }
            (_, KeyCode::PageDown) => {
                self.scroll_offset = self.scroll_offset.saturating_sub(10);
            }
            _ => {}
        }
        Ok(())
    }

    async fn handle_recording_mode_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            // Stop recording
            KeyCode::Char('*') => {
                self.toggle_recording().await?;
            }
            // Cancel recording
            KeyCode::Esc => {
                self.recorder.cancel().await;
                self.input_mode = InputMode::Normal;
                self.status_message = Some("Recording cancelled".to_string());
            }
            _ => {}
        }
        Ok(())
    }

    async fn submit_input(&mut self) -> Result<()> {
        let input = std::mem::take(&mut self.input);
        self.cursor_position = 0;

        // Save to history
        if !input.is_empty() {
            self.input_history.push(input.clone());
            self.history_index = None;
        }

        if input.starts_with('/') {
            // Slash command
            self.handle_slash_command(&input);
        } else {
            // Regular turn
            self.send_turn(&input).await;
        }

        Ok(())
    }

    fn handle_slash_command(&mut self, input: &str) {
        let parts: Vec<&str> = input[1..].splitn(2, ' ').collect();
        let command = parts[0];
        let args = parts.get(1).copied().unwrap_or("").trim();

        match command {
            "quit" | "q" => {
                self.should_quit = true;
            }
            "clear" => {
                self.conversation.clear();
                self.speaker.stop();
                // An in-flight request cannot be aborted, but its reply now
                // carries a stale session and will be dropped on arrival
                self.busy = false;
                self.last_error = None;
                self.scroll_offset = 0;
                self.status_message = Some("Conversation cleared".to_string());
            }
            "model" => {
                if !args.is_empty() {
                    self.model = args.to_string();
                    self.status_message = Some(format!("Model set to: {}", self.model));
                } else {
                    self.status_message = Some(format!("Current model: {}", self.model));
                }
            }
            "lang" => {
                if !args.is_empty() {
                    self.language = args.to_string();
                    self.status_message = Some(format!("Language set to: {}", self.language));
                } else {
                    self.status_message = Some(format!("Current language: {}", self.language));
                }
            }
            "voice" => {
                if !args.is_empty() {
                    self.voice = args.to_string();
                    self.status_message = Some(format!("Voice set to: {}", self.voice));
                } else {
                    self.status_message = Some(format!("Current voice: {}", self.voice));
                }
            }
            "mute" => {
                self.muted = !self.muted;
                if self.muted {
                    self.speaker.stop();
                    self.status_message = Some("Speech output muted".to_string());
                } else {
                    self.status_message = Some("Speech output on".to_string());
                }
            }
            "help" => {
                self.status_message = Some(
                    "* talk | Enter send | /clear /model /lang /voice /mute /quit".to_string(),
                );
            }
            _ => {
                self.status_message = Some(format!("Unknown command: /{command}"));
            }
        }
    }

    /// Record one user utterance and request the assistant's reply
    async fn send_turn(&mut self, utterance: &str) {
        // One request at a time; a second one would race against the
        // conversation with no coordination
        if self.busy {
            self.status_message = Some("Still waiting for the last reply".to_string());
            return;
        }

        self.conversation.begin_turn(utterance);
        self.last_error = None;
        self.busy = true;
        self.scroll_offset = 0;

        let client = self.chat_client.clone();
        let model = self.model.clone();
        let messages = self.conversation.messages().to_vec();
        let session = self.conversation.session();
        let tx = self.message_tx.clone();

        tokio::spawn(async move {
            match client.complete(&model, &messages).await {
                Ok(text) => {
                    let _ = tx.send(AppMessage::Reply { text, session }).await;
                }
                Err(e) => {
                    let error = e.to_string();
                    let _ = tx.send(AppMessage::ChatError { error, session }).await;
                }
            }
        });
    }

    async fn toggle_recording(&mut self) -> Result<()> {
        match self.input_mode {
            InputMode::Normal => {
                if self.busy {
                    self.status_message = Some("Still waiting for the last reply".to_string());
                    return Ok(());
                }
                self.recorder.start()?;
                self.input_mode = InputMode::Recording;
                self.status_message = Some("Listening...".to_string());
            }
            InputMode::Recording => {
                self.recorder.stop(self.language.clone()).await;
                self.input_mode = InputMode::Normal;
                self.status_message = Some("Transcribing...".to_string());
            }
        }
        Ok(())
    }

    fn navigate_history(&mut self, direction: i32) {
        if self.input_history.is_empty() {
            return;
        }

        let new_index = match self.history_index {
            None if direction < 0 => Some(self.input_history.len() - 1),
            Some(i) if direction < 0 && i > 0 => Some(i - 1),
            Some(i) if direction > 0 && i < self.input_history.len() - 1 => Some(i + 1),
            Some(_) if direction > 0 => None,
            idx => idx,
        };

        self.history_index = new_index;
        self.input = match new_index {
            Some(i) => self.input_history[i].clone(),
            None => String::new(),
        };
        self.cursor_position = self.input.chars().count();
    }

    async fn handle_app_message(&mut self, msg: AppMessage) -> Result<()> {
        match msg {
            AppMessage::Transcript(Some(text)) => {
                self.status_message = Some(format!("Heard: {text}"));
                self.send_turn(&text).await;
            }
            AppMessage::Transcript(None) => {
                self.status_message = Some("Didn't catch anything".to_string());
            }
            AppMessage::VoiceError(err) => {
                self.input_mode = InputMode::Normal;
                self.status_message = Some(format!("Voice error: {err}"));
            }
            AppMessage::Reply { text, session } => {
                if session != self.conversation.session() {
                    tracing::debug!("dropping reply for a cleared conversation");
                    return Ok(());
                }
                self.busy = false;
                self.conversation.push(Role::Assistant, text.clone());
                self.status_message = None;
                self.scroll_offset = 0;

                if !self.muted {
                    self.speak(text);
                }
            }
            AppMessage::ChatError { error, session } => {
                if session != self.conversation.session() {
                    tracing::debug!("dropping error for a cleared conversation");
                    return Ok(());
                }
                self.busy = false;
                self.last_error = Some(error);
                self.status_message = Some("Request failed".to_string());
            }
            AppMessage::SpeechError(err) => {
                self.status_message = Some(format!("Speech error: {err}"));
            }
        }
        Ok(())
    }

    /// Vocalize a reply, flushing any utterance still playing
    fn speak(&self, text: String) {
        let voice = self.voice.clone();
        let api_key = self.api_key.clone();
        let speaker = self.speaker.clone();
        let tx = self.message_tx.clone();

        tokio::spawn(async move {
            match speech::synthesize(&text, &voice, &api_key).await {
                Ok((samples, sample_rate)) => speaker.speak(samples, sample_rate),
                Err(e) => {
                    let _ = tx.send(AppMessage::SpeechError(e.to_string())).await;
                }
            }
        });
    }

    fn cleanup(&mut self) -> Result<()> {
        // Restore terminal
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}
