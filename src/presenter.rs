//! Presentation capability the core talks to, plus the terminal front-end.

use std::{
    io::{self, Write},
    sync::Mutex,
};

use crate::{
    db::TripRecord,
    error::TripError,
    fare::DistanceQuote,
    settings::Language,
    trip::{DisplaySnapshot, TripState, TripSummary},
};

/// One-off messages that are not tied to trip data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Welcome,
    Help,
    PreviewDisabled,
    HistorySaveFailed(String),
    HistoryUnavailable(String),
    UnknownCommand(String),
    Goodbye,
}

pub trait Presenter: Send + Sync {
    /// Live figures of the active trip, roughly once per second.
    fn present_display(&self, snapshot: &DisplaySnapshot);
    /// Display refresh while no trip is running.
    fn present_idle(&self);
    fn present_state(&self, state: TripState);
    fn present_summary(&self, summary: &TripSummary);
    fn present_distance(&self, quote: &DistanceQuote, recorded: bool);
    fn present_history(&self, records: &[TripRecord]);
    fn present_error(&self, error: &TripError);
    fn present_notice(&self, notice: &Notice);
}

const PROMPT: &str = "> ";

/// Writes to stdout in English or Spanish. While a trip is running the live
/// display rewrites a single line in place, followed by the input prompt.
pub struct TerminalPresenter {
    language: Language,
    out: Mutex<Output>,
}

struct Output {
    writer: Box<dyn Write + Send>,
    live_line_open: bool,
}

impl TerminalPresenter {
    pub fn new(language: Language) -> Self {
        Self::with_writer(language, Box::new(io::stdout()))
    }

    pub fn with_writer(language: Language, writer: Box<dyn Write + Send>) -> Self {
        Self {
            language,
            out: Mutex::new(Output {
                writer,
                live_line_open: false,
            }),
        }
    }

    fn es(&self) -> bool {
        self.language == Language::Es
    }

    fn state_name(&self, state: TripState) -> &'static str {
        match (state, self.es()) {
            (TripState::Inactive, false) => "inactive",
            (TripState::Stopped, false) => "stopped",
            (TripState::Moving, false) => "moving",
            (TripState::Inactive, true) => "inactivo",
            (TripState::Stopped, true) => "parado",
            (TripState::Moving, true) => "en movimiento",
        }
    }

    fn live(&self, text: &str) {
        let Ok(mut out) = self.out.lock() else {
            return;
        };
        let _ = write!(out.writer, "\r{text:<72} {PROMPT}");
        let _ = out.writer.flush();
        out.live_line_open = true;
    }

    /// Ends the live line, if one is showing, so the terminal is left alone
    /// while no trip runs.
    fn close_live(&self) {
        let Ok(mut out) = self.out.lock() else {
            return;
        };
        if std::mem::take(&mut out.live_line_open) {
            let _ = writeln!(out.writer);
            let _ = out.writer.flush();
        }
    }

    fn line(&self, text: &str) {
        let Ok(mut out) = self.out.lock() else {
            return;
        };
        if std::mem::take(&mut out.live_line_open) {
            let _ = writeln!(out.writer);
        }
        let _ = writeln!(out.writer, "{text}");
        let _ = out.writer.flush();
    }

    pub fn format_display(&self, snapshot: &DisplaySnapshot) -> String {
        if self.es() {
            format!(
                "[{}] Tiempo parado: {:.2} s | Tiempo en movimiento: {:.2} s | Tarifa actual: {:.2} €",
                self.state_name(snapshot.state),
                snapshot.stopped_seconds,
                snapshot.moving_seconds,
                snapshot.current_fare
            )
        } else {
            format!(
                "[{}] Stopped: {:.2} s | Moving: {:.2} s | Current fare: {:.2} €",
                self.state_name(snapshot.state),
                snapshot.stopped_seconds,
                snapshot.moving_seconds,
                snapshot.current_fare
            )
        }
    }

    pub fn format_record(&self, record: &TripRecord) -> String {
        let when = record.recorded_at().format("%Y-%m-%d %H:%M:%S");
        match record {
            TripRecord::Time {
                stopped_seconds,
                moving_seconds,
                total_seconds,
                total_fare,
                ..
            } => {
                if self.es() {
                    format!(
                        "{when}  tiempo     parado {stopped_seconds:.2} s, movimiento {moving_seconds:.2} s, total {total_seconds:.2} s -> {total_fare:.2} €"
                    )
                } else {
                    format!(
                        "{when}  time       stopped {stopped_seconds:.2} s, moving {moving_seconds:.2} s, total {total_seconds:.2} s -> {total_fare:.2} €"
                    )
                }
            }
            TripRecord::Distance {
                distance_km,
                total_fare,
                ..
            } => {
                if self.es() {
                    format!("{when}  distancia  {distance_km:.2} km -> {total_fare:.2} €")
                } else {
                    format!("{when}  distance   {distance_km:.2} km -> {total_fare:.2} €")
                }
            }
        }
    }
}

impl Presenter for TerminalPresenter {
    fn present_display(&self, snapshot: &DisplaySnapshot) {
        self.live(&self.format_display(snapshot));
    }

    fn present_idle(&self) {
        self.close_live();
    }

    fn present_state(&self, state: TripState) {
        let text = if self.es() {
            format!("Estado actual: {}.", self.state_name(state))
        } else {
            format!("Current state: {}.", self.state_name(state))
        };
        self.line(&text);
    }

    fn present_summary(&self, summary: &TripSummary) {
        let text = if self.es() {
            format!(
                "\n -- Fin del viaje --\nTiempo parado: {:.2} segundos\nTiempo en movimiento: {:.2} segundos\nTotal a pagar: {:.2} euros",
                summary.stopped_seconds, summary.moving_seconds, summary.total_fare
            )
        } else {
            format!(
                "\n -- Trip finished --\nTime stopped: {:.2} seconds\nTime moving: {:.2} seconds\nTotal due: {:.2} euros",
                summary.stopped_seconds, summary.moving_seconds, summary.total_fare
            )
        };
        self.line(&text);
    }

    fn present_distance(&self, quote: &DistanceQuote, recorded: bool) {
        let text = match (self.es(), recorded) {
            (true, true) => format!(
                "Distancia: {:.2} km\nTotal a pagar: {:.2} euros",
                quote.distance_km, quote.fare
            ),
            (true, false) => format!("Tarifa actual: {:.2} €", quote.fare),
            (false, true) => format!(
                "Distance: {:.2} km\nTotal due: {:.2} euros",
                quote.distance_km, quote.fare
            ),
            (false, false) => format!("Fare preview: {:.2} €", quote.fare),
        };
        self.line(&text);
    }

    fn present_history(&self, records: &[TripRecord]) {
        if records.is_empty() {
            self.line(if self.es() {
                "El historial está vacío."
            } else {
                "No trips recorded yet."
            });
            return;
        }
        let body = records
            .iter()
            .map(|record| self.format_record(record))
            .collect::<Vec<_>>()
            .join("\n");
        self.line(&body);
    }

    fn present_error(&self, error: &TripError) {
        let text = match (error, self.es()) {
            (TripError::AlreadyActive, false) => "Error: a trip is already in progress.".to_string(),
            (TripError::AlreadyActive, true) => "Error: Hay un viaje en curso.".to_string(),
            (TripError::NoActiveTrip, false) => "Error: there is no trip in progress.".to_string(),
            (TripError::NoActiveTrip, true) => "Error: No hay un viaje en curso.".to_string(),
            (TripError::InvalidDistance(input), false) => format!(
                "Invalid distance '{input}'. It must be a positive number other than 0."
            ),
            (TripError::InvalidDistance(input), true) => format!(
                "Distancia inválida '{input}'. Debe ser un número positivo diferente de 0."
            ),
        };
        self.line(&text);
    }

    fn present_notice(&self, notice: &Notice) {
        let es = self.es();
        let text = match notice {
            Notice::Welcome if es => "Bienvenido al taxímetro".to_string(),
            Notice::Welcome => "Welcome to the taximeter".to_string(),
            Notice::Help if es => "Comandos: start, stop, move, finish, distance <km>, preview <km>, history, help, exit".to_string(),
            Notice::Help => "Commands: start, stop, move, finish, distance <km>, preview <km>, history, help, exit".to_string(),
            Notice::PreviewDisabled if es => "La vista previa de tarifa por distancia está desactivada.".to_string(),
            Notice::PreviewDisabled => "Distance fare preview is disabled.".to_string(),
            Notice::HistorySaveFailed(reason) if es => format!("Aviso: no se pudo guardar el viaje en el historial ({reason})."),
            Notice::HistorySaveFailed(reason) => format!("Warning: the trip could not be saved to history ({reason})."),
            Notice::HistoryUnavailable(reason) if es => format!("No se pudo leer el historial ({reason})."),
            Notice::HistoryUnavailable(reason) => format!("Could not read the history ({reason})."),
            Notice::UnknownCommand(word) if es => format!("Comando no reconocido '{word}'. Escribe 'help' para ver los comandos."),
            Notice::UnknownCommand(word) => format!("Unknown command '{word}'. Type 'help' for the list of commands."),
            Notice::Goodbye if es => "Saliendo del taxímetro, ¡adiós!".to_string(),
            Notice::Goodbye => "Leaving the taximeter, goodbye!".to_string(),
        };
        self.line(&text);
    }
}
