//! Line-oriented console over a live patcher.
//!
//! Every command returns a reply string or a [`ConsoleError`]; nothing a user
//! types can take the console down.

use std::path::PathBuf;
use std::sync::Arc;

use kumiko_config::{ConfigError, EngineConfig, find_patch, load_into, save_from};
use kumiko_core::{Atom, BoxId, PatchError, Patcher, atoms_to_text};
use kumiko_io::BlockDriver;

const HELP: &str = "\
commands:
  create <text>                          create a box, e.g. 'create osc~ 440'
  remove <id>                            remove a box and its connections
  connect <id> <outlet> <id> <inlet>     connect two boxes
  disconnect <id> <outlet> <id> <inlet>  remove a connection
  send <id> <inlet> <atoms...>           send a message into an inlet
  set <id> <attribute> <atoms...>        set a box attribute
  get <id> <attribute>                   show a box attribute
  list                                   show boxes and connections
  objects                                show available objects
  dsp on [sample_rate] [block_size]      start signal processing
  dsp off                                stop signal processing
  save <path>                            write the patch to a file
  load <path|name>                       replace the patch with a file
  help                                   show this text
  quit                                   leave the console";

/// A console command failure, shown to the user as text.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// First word is not a command.
    #[error("unknown command '{0}', try 'help'")]
    UnknownCommand(String),

    /// Wrong arguments for a known command.
    #[error("usage: {0}")]
    Usage(&'static str),

    /// A box id or port index did not parse.
    #[error("'{0}' is not a valid index")]
    BadIndex(String),

    /// The box has no such attribute.
    #[error("box {id} has no attribute '{name}'")]
    UnknownAttribute {
        /// Box addressed.
        id: BoxId,
        /// Attribute requested.
        name: String,
    },

    /// Patch file not found by path or name.
    #[error("patch '{0}' not found")]
    PatchNotFound(String),

    /// The patcher refused the operation.
    #[error(transparent)]
    Patch(#[from] PatchError),

    /// Reading or writing a patch file failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Signal processing could not start.
    #[error(transparent)]
    Io(#[from] kumiko_io::Error),
}

/// What a line asked the console to do next.
#[derive(Debug, PartialEq)]
pub enum Reply {
    /// Show this text and keep reading.
    Text(String),
    /// Leave the console.
    Quit,
}

/// Interprets console commands against one patcher.
pub struct Console {
    patcher: Arc<Patcher>,
    config: EngineConfig,
    driver: Option<BlockDriver>,
}

impl Console {
    /// A console over `patcher`. `config` supplies the `dsp on` defaults.
    pub fn new(patcher: Arc<Patcher>, config: EngineConfig) -> Self {
        Self {
            patcher,
            config,
            driver: None,
        }
    }

    /// Whether `dsp on` is in effect.
    #[cfg(test)]
    pub fn dsp_running(&self) -> bool {
        self.driver.as_ref().is_some_and(BlockDriver::is_running)
    }

    /// Runs one line. Blank lines and `#` comments reply with nothing.
    pub fn execute(&mut self, line: &str) -> Result<Reply, ConsoleError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(Reply::Text(String::new()));
        }
        let (command, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(c, r)| (c, r.trim()));

        let text = match command {
            "create" => self.create(rest)?,
            "remove" => self.remove(rest)?,
            "connect" => self.connect(rest, true)?,
            "disconnect" => self.connect(rest, false)?,
            "send" => self.send(rest)?,
            "set" => self.set(rest)?,
            "get" => self.get(rest)?,
            "list" => self.list(),
            "objects" => self.objects(),
            "dsp" => self.dsp(rest)?,
            "save" => self.save(rest)?,
            "load" => self.load(rest)?,
            "help" => HELP.to_string(),
            "quit" | "exit" => {
                self.stop_dsp();
                return Ok(Reply::Quit);
            }
            other => return Err(ConsoleError::UnknownCommand(other.to_string())),
        };
        Ok(Reply::Text(text))
    }

    fn create(&self, rest: &str) -> Result<String, ConsoleError> {
        if rest.is_empty() {
            return Err(ConsoleError::Usage("create <text>"));
        }
        let id = self.patcher.create_from_text(rest)?;
        Ok(format!("{id}: {}", self.describe(id)))
    }

    fn remove(&self, rest: &str) -> Result<String, ConsoleError> {
        let [id] = words::<1>(rest, "remove <id>")?;
        let id = box_id(id)?;
        self.patcher.remove(id)?;
        Ok(format!("removed {id}"))
    }

    fn connect(&self, rest: &str, connect: bool) -> Result<String, ConsoleError> {
        let usage = if connect {
            "connect <id> <outlet> <id> <inlet>"
        } else {
            "disconnect <id> <outlet> <id> <inlet>"
        };
        let [from, outlet, to, inlet] = words::<4>(rest, usage)?;
        let (from, to) = (box_id(from)?, box_id(to)?);
        let (outlet, inlet) = (index(outlet)?, index(inlet)?);
        if connect {
            self.patcher.connect(from, outlet, to, inlet)?;
            Ok(format!("connected {from}:{outlet} -> {to}:{inlet}"))
        } else {
            self.patcher.disconnect(from, outlet, to, inlet)?;
            Ok(format!("disconnected {from}:{outlet} -> {to}:{inlet}"))
        }
    }

    fn send(&self, rest: &str) -> Result<String, ConsoleError> {
        let usage = "send <id> <inlet> <atoms...>";
        let ([id, inlet], message) = split_words::<2>(rest, usage)?;
        let (id, inlet) = (box_id(id)?, index(inlet)?);
        let atoms = Atom::parse(message);
        if self.patcher.send(id, inlet, &atoms)? {
            Ok(String::new())
        } else {
            Ok(format!("{id} ignored '{}'", atoms_to_text(&atoms)))
        }
    }

    fn set(&self, rest: &str) -> Result<String, ConsoleError> {
        let usage = "set <id> <attribute> <atoms...>";
        let ([id, name], value) = split_words::<2>(rest, usage)?;
        let id = box_id(id)?;
        self.check_attribute(id, name)?;
        self.patcher.set_attribute(id, name, &Atom::parse(value))?;
        self.get(&format!("{id} {name}"))
    }

    fn get(&self, rest: &str) -> Result<String, ConsoleError> {
        let [id, name] = words::<2>(rest, "get <id> <attribute>")?;
        let id = box_id(id)?;
        let attributes = self.check_attribute(id, name)?;
        Ok(format!(
            "{name} = {}",
            atoms_to_text(&attributes.attribute_value(name))
        ))
    }

    fn check_attribute(
        &self,
        id: BoxId,
        name: &str,
    ) -> Result<Arc<kumiko_core::AttributeManager>, ConsoleError> {
        let attributes = self
            .patcher
            .attributes(id)
            .ok_or(PatchError::BoxNotFound(id))?;
        if !attributes.has_attribute(name) {
            return Err(ConsoleError::UnknownAttribute {
                id,
                name: name.to_string(),
            });
        }
        Ok(attributes)
    }

    fn list(&self) -> String {
        let ids = self.patcher.box_ids();
        if ids.is_empty() {
            return "(empty patch)".to_string();
        }
        let mut lines: Vec<String> = ids
            .into_iter()
            .map(|id| format!("{id}: {}", self.describe(id)))
            .collect();
        for c in self.patcher.connections() {
            let kind = if c.signal { "~>" } else { "->" };
            lines.push(format!("{}:{} {kind} {}:{}", c.from, c.outlet, c.to, c.inlet));
        }
        lines.join("\n")
    }

    fn describe(&self, id: BoxId) -> String {
        self.patcher.box_info(id).map_or_else(String::new, |info| {
            format!("{} ({} in, {} out)", info.text, info.inlets.len(), info.outlets.len())
        })
    }

    fn objects(&self) -> String {
        let mut names: Vec<String> = self
            .patcher
            .factory()
            .names()
            .iter()
            .map(|name| name.as_str().to_string())
            .collect();
        names.sort();
        names.join(" ")
    }

    fn dsp(&mut self, rest: &str) -> Result<String, ConsoleError> {
        let usage = "dsp on [sample_rate] [block_size] | dsp off";
        let mut words = rest.split_whitespace();
        match words.next() {
            Some("on") => {
                let sample_rate = match words.next() {
                    Some(word) => word
                        .parse::<u32>()
                        .map_err(|_| ConsoleError::BadIndex(word.to_string()))?,
                    None => self.config.sample_rate,
                };
                let block_size = match words.next() {
                    Some(word) => index(word)?,
                    None => self.config.block_size,
                };
                self.stop_dsp();
                self.driver = Some(BlockDriver::spawn(
                    Arc::clone(&self.patcher),
                    sample_rate,
                    block_size,
                )?);
                Ok(format!("dsp on: {sample_rate} Hz, {block_size} samples"))
            }
            Some("off") => {
                self.stop_dsp();
                Ok("dsp off".to_string())
            }
            _ => Err(ConsoleError::Usage(usage)),
        }
    }

    fn stop_dsp(&mut self) {
        if let Some(mut driver) = self.driver.take() {
            driver.stop();
        }
    }

    fn save(&self, rest: &str) -> Result<String, ConsoleError> {
        if rest.is_empty() {
            return Err(ConsoleError::Usage("save <path>"));
        }
        save_from(&self.patcher, rest)?;
        Ok(format!("saved {} boxes to {rest}", self.patcher.box_count()))
    }

    fn load(&mut self, rest: &str) -> Result<String, ConsoleError> {
        if rest.is_empty() {
            return Err(ConsoleError::Usage("load <path|name>"));
        }
        let path = PathBuf::from(rest);
        let path = if path.is_file() {
            path
        } else {
            find_patch(rest).ok_or_else(|| ConsoleError::PatchNotFound(rest.to_string()))?
        };
        let boxes = load_into(&self.patcher, &path)?;
        Ok(format!("loaded {boxes} boxes from {}", path.display()))
    }
}

impl Drop for Console {
    fn drop(&mut self) {
        self.stop_dsp();
    }
}

/// Exactly `N` whitespace-separated words.
fn words<'a, const N: usize>(
    rest: &'a str,
    usage: &'static str,
) -> Result<[&'a str; N], ConsoleError> {
    let words: Vec<&str> = rest.split_whitespace().collect();
    words.try_into().map_err(|_| ConsoleError::Usage(usage))
}

/// `N` leading words and the untouched remainder.
fn split_words<'a, const N: usize>(
    rest: &'a str,
    usage: &'static str,
) -> Result<([&'a str; N], &'a str), ConsoleError> {
    let mut head: [&'a str; N] = [""; N];
    let mut remainder = rest.trim_start();
    for slot in &mut head {
        if remainder.is_empty() {
            return Err(ConsoleError::Usage(usage));
        }
        let (word, tail) = remainder
            .split_once(char::is_whitespace)
            .unwrap_or((remainder, ""));
        *slot = word;
        remainder = tail.trim_start();
    }
    Ok((head, remainder))
}

fn box_id(word: &str) -> Result<BoxId, ConsoleError> {
    word.parse::<u32>()
        .map(BoxId::from_index)
        .map_err(|_| ConsoleError::BadIndex(word.to_string()))
}

fn index(word: &str) -> Result<usize, ConsoleError> {
    word.parse::<usize>()
        .map_err(|_| ConsoleError::BadIndex(word.to_string()))
}
