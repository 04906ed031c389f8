use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{anyhow, Result};
use log::{info, warn};

use ear_synth::core::volume::MAX_UI_LEVEL;
use ear_synth::utils::helpers::format_frequency;
use ear_synth::utils::render::{render_note, write_wav};
use ear_synth::{EngineConfig, Note, SynthEngine};

const HELP: &str = "\
commands:
  play <note>               play a note, e.g. play C#4
  freq <hz>                 play a raw frequency
  stop                      release the current note
  volume <0-100>            set output volume
  random                    play a random note to identify
  guess <note>              guess the random note
  confidence <semitones>    how far off a guess may be
  render <note> <secs> <file.wav>
  help | quit";

/// Terminal stand-in for the trainer window.
struct Session {
    engine: SynthEngine,
    target: Option<Note>,
    confidence: i32,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("[MAIN] Starting ear-synth");

    let config = match EngineConfig::load() {
        Ok(config) => config,
        Err(e) => {
            warn!("[MAIN] Failed to load engine config, using defaults: {}", e);
            EngineConfig::default()
        }
    };

    let mut engine = SynthEngine::new(config);
    if let Err(e) = engine.start() {
        // The session keeps running without sound either way.
        if e.is_device_unavailable() {
            eprintln!("[MAIN] No usable audio output, continuing silently: {}", e);
        } else {
            eprintln!("[MAIN] Audio engine failed to start: {}", e);
        }
    }

    println!("{HELP}");
    let mut session = Session::new(engine);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let line = line?;
        match session.execute(line.trim()) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => println!("error: {e}"),
        }
    }

    session.engine.stop();
    info!("[MAIN] Bye");
    Ok(())
}

impl Session {
    /// Opens with a note to identify, like the trainer window does.
    fn new(engine: SynthEngine) -> Self {
        let mut session = Session {
            engine,
            target: None,
            confidence: 0,
        };
        session.play_random_note();
        session
    }

    /// Run one command line. Returns false when the session should end.
    fn execute(&mut self, line: &str) -> Result<bool> {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return Ok(true);
        };
        let args: Vec<&str> = words.collect();

        match (command, args.as_slice()) {
            ("play", [note]) => {
                let note: Note = note.parse()?;
                println!("{} ({})", note, format_frequency(note.frequency()));
                self.engine.play_note(note);
            }
            ("freq", [hz]) => {
                let hz: f64 = hz.parse()?;
                self.engine.play_frequency(hz);
            }
            ("stop", []) => self.engine.stop_note(),
            ("volume", [level]) => {
                let level: u8 = level.parse()?;
                if level > MAX_UI_LEVEL {
                    return Err(anyhow!("volume must be 0-{}", MAX_UI_LEVEL));
                }
                self.engine.change_volume(level);
            }
            ("random", []) => self.play_random_note(),
            ("guess", [note]) => self.guess(note.parse()?),
            ("confidence", [n]) => {
                self.confidence = n.parse::<i32>()?.abs();
                println!("accepting guesses within {} semitone(s)", self.confidence);
            }
            ("render", [note, secs, path]) => {
                let note: Note = note.parse()?;
                let secs: f64 = secs.parse()?;
                let config = self.engine.config();
                let samples = render_note(config, note, secs)?;
                write_wav(Path::new(path), config.sample_rate, &samples)?;
                println!("wrote {} samples to {}", samples.len(), path);
            }
            ("help", _) => println!("{HELP}"),
            ("quit", _) | ("exit", _) => return Ok(false),
            _ => println!("unknown command, try 'help'"),
        }
        Ok(true)
    }

    fn play_random_note(&mut self) {
        let note = Note::random(&mut rand::rng());
        info!("Playing Note={}", note);
        self.engine.play_note(note);
        self.target = Some(note);
        println!("listen...");
    }

    fn guess(&mut self, chosen: Note) {
        let Some(target) = self.target else {
            println!("nothing to guess yet, try 'random'");
            return;
        };

        let difference = chosen.semitones_from(&target);
        if difference.abs() <= self.confidence {
            println!("Correct: {}. Guess: {}. Off by {}", target, chosen, difference);
            self.play_random_note();
        } else {
            println!("Wrong");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(SynthEngine::new(EngineConfig::default()))
    }

    #[test]
    fn session_opens_with_a_round() {
        let session = session();
        let target = session.target.unwrap();
        assert!((3..6).contains(&target.octave));
    }

    #[test]
    fn correct_guess_starts_next_round() {
        let mut session = session();
        session.confidence = 12;
        let first = session.target.unwrap();
        session.guess(first);
        assert!(session.target.is_some());
    }

    #[test]
    fn render_rejects_infinite_hold() {
        let mut session = session();
        assert!(session.execute("render A4 inf out.wav").is_err());
        assert!(session.execute("quit").map(|keep| !keep).unwrap());
    }
}
