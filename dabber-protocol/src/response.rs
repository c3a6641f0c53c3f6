//! Controller response classification
//!
//! Lines from the controller fall into a few categories the host cares about:
//! acknowledgments, busy notices, position reports and errors. Anything else
//! (temperature reports, echo lines, start banners) is passed through as
//! [`Response::Other`].

/// Machine position parsed from an `M114` report
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PositionReport {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub a: f64,
    pub b: f64,
}

impl PositionReport {
    /// Parse a line of the form `X:<v> Y:<v> Z:<v> A:<v> B:<v>`
    ///
    /// Trailing fields (such as Marlin's `Count X:...` stepper counts) are
    /// ignored. All five axes must be present.
    pub fn parse(line: &str) -> Option<Self> {
        let mut x = None;
        let mut y = None;
        let mut z = None;
        let mut a = None;
        let mut b = None;

        for token in line.split_whitespace() {
            if token == "Count" {
                break;
            }
            let Some((key, value)) = token.split_once(':') else {
                continue;
            };
            let slot = match key {
                "X" => &mut x,
                "Y" => &mut y,
                "Z" => &mut z,
                "A" => &mut a,
                "B" => &mut b,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.parse::<f64>().ok()?);
            }
        }

        Some(Self {
            x: x?,
            y: y?,
            z: z?,
            a: a?,
            b: b?,
        })
    }
}

/// Classified controller line
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Response {
    /// Command accepted
    Ok,
    /// Controller is still working on a long command
    Busy,
    /// Position report
    Position(PositionReport),
    /// Controller reported an error
    Error,
    /// Anything else
    Other,
}

impl Response {
    /// Classify a received line
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line == "ok" || line.starts_with("ok ") {
            Response::Ok
        } else if line.starts_with("echo:busy") {
            Response::Busy
        } else if line.starts_with("Error") || line.starts_with("error") || line.starts_with("!!")
        {
            Response::Error
        } else if let Some(report) = PositionReport::parse(line) {
            Response::Position(report)
        } else {
            Response::Other
        }
    }
}
