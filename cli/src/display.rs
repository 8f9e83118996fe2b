use {
    crate::prelude::*,
    colored::ColoredString,
    ga4_mp_sdk::ValidationMessage,
    std::{
        sync::{Arc, Mutex},
        thread,
    },
};

/// Print a grey colored line to separate sections
pub(crate) fn separator() -> ColoredString {
    "\n-=-=-=-=-=-=-=-".truecolor(100, 100, 100)
}

/// Print the title of the currently executed command.
#[macro_export]
macro_rules! command_title {
    ($($args:tt)*) => {
        if !JSON_MODE.load(Ordering::Relaxed) {
            println!(
                "\n{arrow} {title}{separator}",
                arrow = "▶".bold().purple(),
                title = format!($($args)*).bold(),
                separator = $crate::display::separator()
            );
        }
    };
}

/// Notify the user of a successful operation. Basicaly [`println!`] but
/// includes a not [`JSON_MODE`] check and some success formatting.
#[macro_export]
macro_rules! notify_success {
    ($($args:tt)*) => {
        if !JSON_MODE.load(Ordering::Relaxed) {
            println!(
                "[{check}] {msg}",
                check = "✔".green().bold(),
                msg = format!($($args)*)
            );
        }
    };
}

/// Similar to [`notify_success!`] but for errors.
#[macro_export]
macro_rules! notify_error {
    ($($args:tt)*) => {
        if !JSON_MODE.load(Ordering::Relaxed) {
            eprintln!(
                "[{ballot}] {msg}",
                ballot = "✘".red().bold(),
                msg = format!($($args)*)
            );
        }
    };
}

/// Formatted list item.
#[macro_export]
macro_rules! item {
    ($($args:tt)*) => {
        if !JSON_MODE.load(Ordering::Relaxed) {
            println!(
                "    {arrow} {item}",
                arrow = "▶".truecolor(100, 100, 100),
                item = format!($($args)*)
            );
        }
    };
}

/// Macro to print a loading state. Accepts a message and returns a
/// [LoadingHandle] to finish the loading with either success or error.
#[macro_export]
macro_rules! loading {
    ($($args:tt)*) => {{
        $crate::display::LoadingHandle::spawn(format!($($args)*))
    }};
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum LoadingState {
    Spinning,
    Succeeded,
    Failed,
}

/// Struct helping with handling loading state.
pub(crate) struct LoadingHandle {
    state: Arc<Mutex<LoadingState>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl LoadingHandle {
    /// Start spinning next to `msg`. Nothing is printed in [JSON_MODE].
    pub(crate) fn spawn(msg: String) -> Self {
        let state = Arc::new(Mutex::new(LoadingState::Spinning));

        if JSON_MODE.load(Ordering::Relaxed) {
            return Self {
                state,
                thread: None,
            };
        }

        let thread = {
            let state = state.clone();

            thread::spawn(move || {
                use std::io::Write;

                let frames = ["/", "-", "\\", "|"];
                let mut i = 0;

                loop {
                    let current = state.lock().map(|s| *s).unwrap_or(LoadingState::Failed);

                    match current {
                        LoadingState::Spinning => {
                            print!("\r[{}] {msg} ", frames[i].purple());
                        }
                        LoadingState::Succeeded => {
                            println!("\r[{check}] {msg}", check = "✔".green().bold());

                            break;
                        }
                        LoadingState::Failed => {
                            println!("\r[{ballot}] {msg}", ballot = "✘".red().bold());

                            break;
                        }
                    }

                    i = (i + 1) % frames.len();

                    let _ = std::io::stdout().flush();

                    thread::sleep(Duration::from_millis(100));
                }
            })
        };

        Self {
            state,
            thread: Some(thread),
        }
    }

    /// Mark the loading as successful.
    pub(crate) fn success(self) {
        self.finish(LoadingState::Succeeded);
    }

    /// Mark the loading as errored.
    pub(crate) fn error(self) {
        self.finish(LoadingState::Failed);
    }

    fn finish(mut self, outcome: LoadingState) {
        if let Ok(mut state) = self.state.lock() {
            *state = outcome;
        }

        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// If [`JSON_MODE`] is enabled, output the given data as JSON.
pub(crate) fn json_output<T: Serialize>(data: &T) -> AnyResult<(), MpCliError> {
    if !JSON_MODE.load(Ordering::Relaxed) {
        return Ok(());
    }

    match serde_json::to_string_pretty(data) {
        Ok(json) => {
            println!("{json}");

            Ok(())
        }
        Err(e) => Err(MpCliError::Any(e.into())),
    }
}

/// Print validation findings, one block per message.
pub(crate) fn print_validation_messages(messages: &[ValidationMessage]) {
    if JSON_MODE.load(Ordering::Relaxed) {
        return;
    }

    for message in messages {
        println!(
            "\n{ballot} {description}",
            ballot = "✘".red().bold(),
            description = message.description.bold()
        );
        println!(
            "    {label} {path}  {code_label} {code}",
            label = "field:".truecolor(100, 100, 100),
            path = message.field_path,
            code_label = "code:".truecolor(100, 100, 100),
            code = message.validation_code.yellow()
        );

        if let Some(documentation) = &message.documentation {
            println!(
                "    {label} {documentation}",
                label = "docs:".truecolor(100, 100, 100),
            );
        }
    }
}
