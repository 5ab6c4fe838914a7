use reedline::{
    ColumnarMenu, Emacs, FileBackedHistory, History, HistoryItem, KeyCode, KeyModifiers,
    MenuBuilder, Reedline, ReedlineEvent, ReedlineMenu, Signal, default_emacs_keybindings,
};
use tracing::debug;

use crate::error::{Result, VqlshError};

use super::completer::VqlCompleter;
use super::prompt::VqlPrompt;
use super::state::ConsoleState;

const COMPLETION_MENU_NAME: &str = "completion_menu";

/// Lower bound on the editor's in-memory history
const MIN_HISTORY_CAPACITY: usize = 1_000;

/// Line editor for the console
pub struct ConsoleEngine {
    /// Line editor for statement input
    editor: Reedline,

    prompt: VqlPrompt,
}

impl ConsoleEngine {
    /// Create a new console engine
    ///
    /// # Arguments
    /// * `completer` - Completer backing the Tab menu
    /// * `state` - Persisted session state, used to seed editor history
    ///
    /// # Returns
    /// * `Result<Self>` - New engine or error
    pub fn new(completer: VqlCompleter, state: &ConsoleState) -> Result<Self> {
        let mut keybindings = default_emacs_keybindings();
        keybindings.add_binding(
            KeyModifiers::NONE,
            KeyCode::Tab,
            ReedlineEvent::UntilFound(vec![
                ReedlineEvent::Menu(COMPLETION_MENU_NAME.to_string()),
                ReedlineEvent::MenuNext,
            ]),
        );

        let menu = ColumnarMenu::default().with_name(COMPLETION_MENU_NAME);
        let editor = Reedline::create()
            .with_history(Box::new(seeded_history(state)?))
            .with_completer(Box::new(completer))
            .with_menu(ReedlineMenu::EngineCompleter(Box::new(menu)))
            .with_edit_mode(Box::new(Emacs::new(keybindings)));

        Ok(Self {
            editor,
            prompt: VqlPrompt::default(),
        })
    }

    /// Read a single line of input
    ///
    /// Ctrl-C discards the line being edited and yields an empty line.
    ///
    /// # Returns
    /// * `Result<Option<String>>` - Input line or None on Ctrl-D / end of input
    pub fn read_line(&mut self) -> Result<Option<String>> {
        match self.editor.read_line(&self.prompt)? {
            Signal::Success(line) => Ok(Some(line)),
            Signal::CtrlC => Ok(Some(String::new())),
            Signal::CtrlD => Ok(None),
        }
    }
}

/// In-memory editor history holding the persisted statements, oldest first
fn seeded_history(state: &ConsoleState) -> Result<FileBackedHistory> {
    let capacity = state.len().max(MIN_HISTORY_CAPACITY);
    let mut history = FileBackedHistory::new(capacity).map_err(history_error)?;

    for statement in state.history() {
        history
            .save(HistoryItem::from_command_line(statement.as_str()))
            .map_err(history_error)?;
    }
    debug!("Seeded editor history with {} statements", state.len());

    Ok(history)
}

fn history_error(err: reedline::ReedlineError) -> VqlshError {
    VqlshError::Generic(format!("History error: {}", err))
}
