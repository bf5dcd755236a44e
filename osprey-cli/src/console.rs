use std::fmt;
use std::io::BufRead;
use std::sync::mpsc;

use anyhow::{Context, Result, bail};
use log::error;
use mcs51::{Fault, Machine, Sfr};

/// A single parsed line of console input
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Empty,
    Quit,
    Dump,
    Execute(Vec<u8>),
}

/// Parses a line of console input
///
/// Anything that isn't a `/` command is read as whitespace-separated hex
/// bytes, e.g. `75 30 ff`.
pub fn parse_line(line: &str) -> Result<Command> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Command::Empty);
    }
    if let Some(cmd) = line.strip_prefix('/') {
        return match cmd.split_whitespace().next() {
            Some("quit" | "exit" | "q") => Ok(Command::Quit),
            Some("dump") => Ok(Command::Dump),
            _ => bail!("unknown command {line:?}"),
        };
    }
    let bytes = line
        .split_whitespace()
        .map(|b| {
            if b.len() > 2 {
                bail!("{b:?} is not a single byte");
            }
            u8::from_str_radix(b, 16)
                .with_context(|| format!("invalid hex byte {b:?}"))
        })
        .collect::<Result<Vec<u8>>>()?;
    Ok(Command::Execute(bytes))
}

/// What the console should do after handling a line
#[derive(Debug)]
pub enum Reply {
    Nothing,
    Quit,
    Dump,
    /// The instruction faulted; state is dumped after the error
    Fault(Fault),
}

/// Parses a line of input and runs it against the machine
pub fn handle(m: &mut Machine, line: &str) -> Result<Reply> {
    let r = match parse_line(line)? {
        Command::Empty => Reply::Nothing,
        Command::Quit => Reply::Quit,
        Command::Dump => Reply::Dump,
        Command::Execute(bytes) => match m.execute(&bytes) {
            Ok(()) => Reply::Dump,
            Err(e) => Reply::Fault(e),
        },
    };
    Ok(r)
}

/// Spawns a worker thread that reads lines from `input` and emits them
///
/// Lines which aren't valid UTF-8 are decoded lossily, so they reach the
/// parser (and its error reporting) instead of ending the session.  The
/// channel closes at EOF or on a read error.
pub fn worker<R>(mut input: R) -> mpsc::Receiver<String>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let mut buf = vec![];
        loop {
            buf.clear();
            match input.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => (),
                Err(e) => {
                    error!("failed to read input: {e}");
                    break;
                }
            }
            let line = String::from_utf8_lossy(&buf);
            let line = line.trim_end_matches(['\r', '\n']).to_owned();
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Formats the full machine state
pub struct Dump<'a>(pub &'a Machine);

impl fmt::Display for Dump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let m = self.0;
        writeln!(f, "Memory:")?;
        for (i, row) in m.data().chunks(16).enumerate() {
            write!(f, "  {:02x}:", i * 16)?;
            for b in row {
                write!(f, " {b:02x}")?;
            }
            writeln!(f)?;
        }

        writeln!(f, "Registers:")?;
        for r in Sfr::ALL {
            let v = m.sfr(r);
            writeln!(
                f,
                "  {:<4} ({:02x})  {v:#010b}  {v:#04x}  {v:>3}",
                r.name(),
                r.addr()
            )?;
        }

        let psw = m.psw();
        let flags: Vec<_> = psw.iter_names().map(|(name, _)| name).collect();
        writeln!(f, "A:     {:#04x}", m.sfr(Sfr::Acc))?;
        writeln!(f, "PC:    {:#06x}", m.pc())?;
        writeln!(f, "SP:    {:#04x}", m.sfr(Sfr::Sp))?;
        writeln!(f, "Bank:  {}", m.active_bank())?;
        write!(f, "Flags: {}", flags.join(" "))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn commands() {
        assert_eq!(parse_line("").unwrap(), Command::Empty);
        assert_eq!(parse_line("   \t").unwrap(), Command::Empty);
        for q in ["/quit", "/exit", "/q", "  /q  "] {
            assert_eq!(parse_line(q).unwrap(), Command::Quit, "{q:?}");
        }
        assert_eq!(parse_line("/dump").unwrap(), Command::Dump);
        assert!(parse_line("/frobnicate").is_err());
    }

    #[test]
    fn bytes() {
        assert_eq!(
            parse_line("75 30 ff").unwrap(),
            Command::Execute(vec![0x75, 0x30, 0xff])
        );
        assert_eq!(
            parse_line("  e4\t04 ").unwrap(),
            Command::Execute(vec![0xe4, 0x04])
        );
        assert_eq!(parse_line("A5").unwrap(), Command::Execute(vec![0xa5]));
        assert!(parse_line("zz").is_err());
        assert!(parse_line("7530").is_err());
        assert!(parse_line("74 -1").is_err());
    }

    #[test]
    fn bad_utf8_keeps_the_session_alive() {
        let input = std::io::Cursor::new(b"74 2a\n\xff\n04\r\n/dump".to_vec());
        let lines: Vec<_> = worker(input).iter().collect();
        assert_eq!(lines, ["74 2a", "\u{fffd}", "04", "/dump"]);

        let mut m = Machine::new();
        let replies: Vec<_> =
            lines.iter().map(|line| handle(&mut m, line)).collect();
        assert!(matches!(replies[0], Ok(Reply::Dump)));
        assert!(replies[1].is_err());
        assert!(matches!(replies[2], Ok(Reply::Dump)));
        assert!(matches!(replies[3], Ok(Reply::Dump)));
        assert_eq!(m.sfr(Sfr::Acc), 0x2b);
        assert_eq!(m.pc(), 3);
    }

    #[test]
    fn faults_are_reported() {
        let mut m = Machine::new();
        handle(&mut m, "74 2a").unwrap();
        match handle(&mut m, "a5").unwrap() {
            Reply::Fault(e) => assert_eq!(e, Fault::UnknownOpcode(0xa5)),
            r => panic!("unexpected reply {r:?}"),
        }
        assert!(matches!(handle(&mut m, "/q").unwrap(), Reply::Quit));
        assert!(matches!(handle(&mut m, "").unwrap(), Reply::Nothing));
        assert_eq!(m.pc(), 2);
    }

    #[test]
    fn dump_contents() {
        let mut m = Machine::new();
        m.reset();
        m.execute(&[0x74, 0x2a]).unwrap();
        m.execute(&[0xd3]).unwrap();
        m.set_bank(2).unwrap();

        let s = Dump(&m).to_string();
        let lines: Vec<_> = s.lines().collect();
        assert_eq!(lines[0], "Memory:");
        assert_eq!(lines[1].split_whitespace().count(), 17);
        assert_eq!(lines[17], "Registers:");
        assert!(s.contains("  ACC  (e0)  0b00101010  0x2a   42"));
        assert!(s.contains("  SP   (81)  0b00000111  0x07    7"));
        assert!(s.contains("A:     0x2a"));
        assert!(s.contains("PC:    0x0003"));
        assert!(s.contains("Bank:  2"));
        assert!(s.ends_with("Flags: CY RS1"));
    }
}
