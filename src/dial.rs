//! Interactive dial session.
//!
//! A line-oriented stand-in for the camera's scroll pickers. Each line is one
//! command; any change to a dial re-renders immediately and prints the report.
//!
//! ```text
//! aperture 2.8      select a stop by value
//! shutter +         one stop faster
//! iso -2            two stops down
//! save [path]       write the current preview
//! status            reprint the last report
//! help | quit
//! ```
//!
//! Suggestions for non-ok renders are requested on a background thread. Any
//! that have arrived are printed just before each prompt. A reply that arrives after the dials have
//! moved on is still shown, labelled with the settings it answers.

use crate::camera::{CameraParameters, Dial, ParamError, parse_stop};
use crate::imaging::{BackendError, ImageBackend};
use crate::output;
use crate::session::{Render, Session, default_output_path, noise_rng};
use crate::suggest::{Alert, SuggestionClient, SuggestionService, spawn_suggestion};
use rand::rngs::StdRng;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum DialError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}', type 'help' for a list")]
    UnknownCommand(String),
    #[error("{0} needs a value, '+' or '-'")]
    MissingValue(&'static str),
    #[error("'{0}' is not a step count")]
    BadStep(String),
    #[error(transparent)]
    Param(#[from] ParamError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// One parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum DialCommand {
    /// Select the stop at this index.
    Set(Dial, usize),
    /// Move by this many stops.
    Step(Dial, i32),
    Save(Option<PathBuf>),
    Status,
    Help,
    Quit,
}

pub const HELP: &[&str] = &[
    "aperture|shutter|iso <value>   select a stop (f/2.8, 1/250, 800)",
    "aperture|shutter|iso +|-[n]    move n stops (default 1)",
    "save [path]                    write the current preview",
    "status                         show the last report",
    "help                           this list",
    "quit                           leave",
];

fn dial_for(word: &str) -> Option<Dial> {
    match word {
        "aperture" | "a" | "f" => Some(Dial::Aperture),
        "shutter" | "s" | "t" => Some(Dial::Shutter),
        "iso" | "i" => Some(Dial::Iso),
        _ => None,
    }
}

/// Parse `+`, `-`, `+n` or `-n`. Anything else is not a step.
fn parse_step(text: &str) -> Option<Result<i32, DialError>> {
    let (sign, rest) = match text.as_bytes().first()? {
        b'+' => (1, &text[1..]),
        b'-' => (-1, &text[1..]),
        _ => return None,
    };
    if rest.is_empty() {
        return Some(Ok(sign));
    }
    Some(
        rest.parse::<i32>()
            .map(|n| sign * n)
            .map_err(|_| DialError::BadStep(text.to_string())),
    )
}

/// Parse one line of dial input.
pub fn parse_command(line: &str) -> Result<DialCommand, DialError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Err(DialError::Empty);
    };
    let head = head.to_ascii_lowercase();
    let rest: Vec<&str> = words.collect();

    if let Some(dial) = dial_for(&head) {
        if rest.is_empty() {
            return Err(DialError::MissingValue(dial.name()));
        }
        let value = rest.join(" ");
        if let Some(step) = parse_step(&value) {
            return Ok(DialCommand::Step(dial, step?));
        }
        return Ok(DialCommand::Set(dial, parse_stop(dial, &value)?));
    }

    match head.as_str() {
        "save" | "w" => Ok(DialCommand::Save(rest.first().map(PathBuf::from))),
        "status" | "show" => Ok(DialCommand::Status),
        "help" | "?" => Ok(DialCommand::Help),
        "quit" | "exit" | "q" => Ok(DialCommand::Quit),
        _ => Err(DialError::UnknownCommand(head)),
    }
}

/// Print alerts that have arrived so far. Returns how many were shown.
pub fn drain_alerts(rx: &Receiver<Alert>, current: &CameraParameters) -> usize {
    let mut shown = 0;
    for alert in rx.try_iter() {
        if alert.is_stale(current) {
            info!(
                "Suggestion for {} arrived after settings changed",
                alert.requested_for
            );
        }
        output::print_alert(&alert, current);
        shown += 1;
    }
    shown
}

/// State for one interactive run.
pub struct DialSession<'a, B, S> {
    session: Session,
    backend: &'a B,
    client: Option<Arc<SuggestionClient<S>>>,
    rng: StdRng,
    current: Option<Render>,
    alerts_tx: Sender<Alert>,
    alerts_rx: Receiver<Alert>,
}

impl<'a, B, S> DialSession<'a, B, S>
where
    B: ImageBackend,
    S: SuggestionService + 'static,
{
    /// `client` of `None` disables suggestions.
    pub fn new(
        session: Session,
        backend: &'a B,
        client: Option<Arc<SuggestionClient<S>>>,
        seed: Option<u64>,
    ) -> Self {
        let (alerts_tx, alerts_rx) = mpsc::channel();
        Self {
            session,
            backend,
            client,
            rng: noise_rng(seed),
            current: None,
            alerts_tx,
            alerts_rx,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn current(&self) -> Option<&Render> {
        self.current.as_ref()
    }

    /// Render the current settings, print the report, and ask for advice in
    /// the background if the frame is not ok.
    pub fn rerender(&mut self) {
        let Some(render) = self.session.render(&mut self.rng) else {
            return;
        };
        output::print_render_report(&render);
        if let Some(client) = &self.client {
            if !render.classification.status.is_ok() {
                spawn_suggestion(
                    Arc::clone(client),
                    render.params,
                    render.classification.clone(),
                    self.alerts_tx.clone(),
                );
            }
        }
        self.current = Some(render);
    }

    /// Apply one command. Returns `false` when the session should end.
    pub fn apply(&mut self, command: DialCommand) -> Result<bool, DialError> {
        debug!("Dial command: {command:?}");
        match command {
            DialCommand::Set(dial, index) => {
                self.session.select(dial, index);
                self.rerender();
            }
            DialCommand::Step(dial, delta) => {
                self.session.step(dial, delta);
                self.rerender();
            }
            DialCommand::Save(path) => {
                if let Some(render) = &self.current {
                    let path = path.unwrap_or_else(default_output_path);
                    render.save_preview(self.backend, &path)?;
                    println!("Saved {}", path.display());
                }
            }
            DialCommand::Status => match &self.current {
                Some(render) => output::print_render_report(render),
                None => output::print_stops(self.session.params()),
            },
            DialCommand::Help => {
                for line in HELP {
                    println!("{line}");
                }
            }
            DialCommand::Quit => return Ok(false),
        }
        Ok(true)
    }

    /// Read commands from `input` until `quit` or end of input.
    ///
    /// Bad commands and failed saves are reported and the loop continues;
    /// only a read error ends it early.
    pub fn run(mut self, input: impl BufRead) -> Result<Session, DialError> {
        self.rerender();
        self.prompt()?;
        for line in input.lines() {
            let line = line?;
            if !line.trim().is_empty() {
                match parse_command(&line).and_then(|cmd| self.apply(cmd)) {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => println!("{e}"),
                }
            }
            self.prompt()?;
        }
        drain_alerts(&self.alerts_rx, self.session.params());
        Ok(self.session)
    }

    /// Show any suggestions that have arrived, then the `> ` prompt.
    ///
    /// Returns how many suggestions were shown.
    pub fn prompt(&self) -> io::Result<usize> {
        let shown = drain_alerts(&self.alerts_rx, self.session.params());
        let mut out = io::stdout();
        write!(out, "> ")?;
        out.flush()?;
        Ok(shown)
    }
}
