//! Legacy notes grammar
//!
//! Comparison results persisted inside the free-text `notes` column. Each
//! block starts with a prefix naming the comparison kind and carries
//! `Label: value unit` tokens separated by `|`. Hydrometer results span
//! several lines under a sentinel line. Free text may precede a block.
//!
//! Numbers are always written with `.`; `,` is accepted when reading because
//! older rows were typed by hand.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;

use super::ComparisonNote;
use crate::comparison::{
    BalanceComparison, ComparisonResult, HydrometerComparison, HydrometerSide,
    KarlFischerComparison, KarlFischerTrial, MonthlyTemperatureComparison, TapeComparison,
    TemperatureComparison,
};
use crate::model::ComparisonKind;
use crate::units::{parse_decimal, LengthUnit, MassUnit, Measured, TemperatureUnit};
use crate::utils::text::fold_accents;

pub const PREFIX_TEMPERATURE: &str = "Comparación termómetro";
pub const PREFIX_MONTHLY_TEMPERATURE: &str = "Comparación mensual termómetro";
pub const PREFIX_TAPE: &str = "Comparación cinta";
pub const PREFIX_BALANCE: &str = "Comparación balanza";
pub const PREFIX_KARL_FISCHER: &str = "Comparación Karl Fischer";
pub const HYDROMETER_SENTINEL: &str = "[HIDROMETRO API-60F]";

const SEP: &str = " | ";

lazy_static! {
    static ref BLOCK_MARKER: Regex = Regex::new(
        r"(?i)comparaci[oó]n\s+(mensual\s+term[oó]metro|term[oó]metro|cinta|balanza|karl\s+fischer)"
    )
    .expect("block marker regex");
    static ref EMP_TOKEN: Regex =
        Regex::new(r"(?i)\bEMP\s*:\s*(-?[0-9]+(?:[.,][0-9]+)?)\s*(mg|g|kg)?").expect("emp token regex");
}

// ──────────────────────────────────────────────────────────────────────────────
// ENCODING
// ──────────────────────────────────────────────────────────────────────────────

fn verdict_word(passed: bool) -> &'static str {
    if passed { "Conforme" } else { "No conforme" }
}

fn temperature_tokens(tokens: &mut Vec<String>, label: &str, point: &TemperatureComparison) {
    tokens.push(format!("{} equipo: {} {}", label, point.under.value, point.under.unit));
    tokens.push(format!("{} patron: {} {}", label, point.reference.value, point.reference.unit));
}

/// Render a comparison as a legacy notes block
pub fn encode(note: &ComparisonNote) -> String {
    let id_token = format!("Patron ID: {}", note.reference_id);
    let passed = note.result.passes();

    match &note.result {
        ComparisonResult::Temperature(c) => [
            PREFIX_TEMPERATURE.to_string(),
            id_token,
            format!("Lectura equipo: {} {}", c.under.value, c.under.unit),
            format!("Lectura patron: {} {}", c.reference.value, c.reference.unit),
            format!("Diferencia: {} F", c.diff_f),
            format!("Resultado: {}", verdict_word(passed)),
        ]
        .join(SEP),
        ComparisonResult::MonthlyTemperature(c) => {
            let mut tokens = vec![PREFIX_MONTHLY_TEMPERATURE.to_string(), id_token];
            for (label, point) in [("Alto", &c.high), ("Medio", &c.mid), ("Bajo", &c.low)] {
                temperature_tokens(&mut tokens, label, point);
                tokens.push(format!("Diferencia {}: {} F", label.to_lowercase(), point.diff_f));
            }
            tokens.push(format!("Resultado: {}", verdict_word(passed)));
            tokens.join(SEP)
        }
        ComparisonResult::Tape(c) => {
            let mut tokens = vec![PREFIX_TAPE.to_string(), id_token];
            for (i, v) in c.under.iter().enumerate() {
                tokens.push(format!("Lectura equipo {}: {} {}", i + 1, v, c.under_unit));
            }
            for (i, v) in c.reference.iter().enumerate() {
                tokens.push(format!("Lectura patron {}: {} {}", i + 1, v, c.reference_unit));
            }
            tokens.push(format!("Promedio equipo: {} mm", c.avg_under_mm));
            tokens.push(format!("Promedio patron: {} mm", c.avg_reference_mm));
            tokens.push(format!("Diferencia (Patron-Equipo): {} mm", c.diff_mm));
            tokens.push(format!("Resultado: {}", verdict_word(passed)));
            tokens.join(SEP)
        }
        ComparisonResult::Balance(c) => [
            PREFIX_BALANCE.to_string(),
            id_token,
            format!("Pesa: {} {}", c.weight.value, c.weight.unit),
            format!("Lectura balanza: {} {}", c.reading.value, c.reading.unit),
            format!("Diferencia (Pesa-Balanza): {} g", c.diff_g),
            format!("EMP: {} g", c.emp_g),
            format!("Resultado: {}", verdict_word(passed)),
        ]
        .join(SEP),
        ComparisonResult::Hydrometer(c) => {
            let side = |label: &str, s: &HydrometerSide| {
                [
                    label.to_string(),
                    format!("API: {}", s.api),
                    format!("Temperatura: {} {}", s.temperature.value, s.temperature.unit),
                    format!("API 60F: {}", s.api60f),
                ]
                .join(SEP)
            };
            [
                HYDROMETER_SENTINEL.to_string(),
                id_token,
                side("Equipo", &c.work),
                side("Patron", &c.reference),
                [
                    format!("Diferencia API 60F: {}", c.diff_api),
                    format!("Resultado: {}", verdict_word(passed)),
                ]
                .join(SEP),
            ]
            .join("\n")
        }
        ComparisonResult::KarlFischer(c) => {
            let mut tokens = vec![PREFIX_KARL_FISCHER.to_string(), id_token];
            for (i, t) in c.trials.iter().enumerate() {
                tokens.push(format!("Peso {}: {} mg", i + 1, t.weight_mg));
                tokens.push(format!("Volumen {}: {} mL", i + 1, t.volume_ml));
                tokens.push(format!("Factor {}: {}", i + 1, t.factor));
            }
            tokens.push(format!("Factor promedio: {}", c.average_factor));
            tokens.push(format!("Error relativo: {} %", c.relative_error_pct));
            tokens.push(format!("Resultado: {}", verdict_word(passed)));
            tokens.join(SEP)
        }
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// DECODING
// ──────────────────────────────────────────────────────────────────────────────

/// `Label: value` pairs of one block, labels accent-folded and lowercased
#[derive(Debug, Default)]
struct Tokens {
    values: BTreeMap<String, String>,
}

impl Tokens {
    fn parse(segment: &str) -> Self {
        let mut tokens = Tokens::default();
        tokens.extend(segment);
        tokens
    }

    fn extend(&mut self, segment: &str) {
        for token in segment.split('|') {
            if let Some((label, value)) = token.split_once(':') {
                self.values
                    .insert(fold_accents(label.trim()), value.trim().to_string());
            }
        }
    }

    fn raw(&self, label: &str) -> Option<&str> {
        self.values.get(label).map(String::as_str)
    }

    fn number(&self, label: &str) -> Option<f64> {
        parse_decimal(self.raw(label)?.split_whitespace().next()?)
    }

    /// Value and the unit word following it
    fn quantity(&self, label: &str) -> Option<(f64, &str)> {
        let mut words = self.raw(label)?.split_whitespace();
        let value = parse_decimal(words.next()?)?;
        Some((value, words.next().unwrap_or("")))
    }

    fn temperature(&self, label: &str) -> Option<Measured<TemperatureUnit>> {
        let (value, unit) = self.quantity(label)?;
        Some(Measured::new(value, TemperatureUnit::parse(unit)?))
    }

    fn mass(&self, label: &str) -> Option<Measured<MassUnit>> {
        let (value, unit) = self.quantity(label)?;
        Some(Measured::new(value, MassUnit::parse(unit)?))
    }

    /// Mass expressed in grams whatever unit was written
    fn grams(&self, label: &str) -> Option<f64> {
        let (value, unit) = self.quantity(label)?;
        match unit {
            "" => Some(value),
            other => MassUnit::parse(other).map(|u| u.to_grams(value)),
        }
    }

    /// Numbered readings `<prefix> 1`, `<prefix> 2`, ... in order, with their unit
    fn series(&self, prefix: &str) -> Option<(Vec<f64>, LengthUnit)> {
        let mut values = Vec::new();
        let mut unit = None;
        for n in 1.. {
            let Some((value, u)) = self.quantity(&format!("{} {}", prefix, n)) else {
                break;
            };
            values.push(value);
            unit = unit.or_else(|| LengthUnit::parse(u));
        }
        Some((values, unit?))
    }
}

fn is_sentinel(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case(HYDROMETER_SENTINEL)
}

/// Byte offset just past the hydrometer sentinel line
fn after_sentinel(text: &str) -> Option<usize> {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        offset += line.len();
        if is_sentinel(line) {
            return Some(offset);
        }
    }
    None
}

/// Where a block starts and which kind it is
fn locate(text: &str) -> Option<(ComparisonKind, &str)> {
    if let Some(offset) = after_sentinel(text) {
        return Some((ComparisonKind::Hydrometer, &text[offset..]));
    }

    let found = BLOCK_MARKER.captures_iter(text).last()?;
    let whole = found.get(0)?;
    let kind = match fold_accents(found.get(1)?.as_str()).split_whitespace().next()? {
        "mensual" => ComparisonKind::MonthlyTemperature,
        "termometro" => ComparisonKind::Temperature,
        "cinta" => ComparisonKind::Tape,
        "balanza" => ComparisonKind::Balance,
        "karl" => ComparisonKind::KarlFischer,
        _ => return None,
    };
    let rest = &text[whole.end()..];
    let line = rest.split('\n').next().unwrap_or(rest);
    Some((kind, line))
}

fn temperature_point(tokens: &Tokens, label: &str) -> Option<TemperatureComparison> {
    Some(TemperatureComparison {
        under: tokens.temperature(&format!("{} equipo", label))?,
        reference: tokens.temperature(&format!("{} patron", label))?,
        diff_f: tokens.number(&format!("diferencia {}", label))?,
    })
}

fn hydrometer_block(body: &str) -> Option<(Tokens, HydrometerComparison)> {
    let mut general = Tokens::default();
    let mut sides: BTreeMap<String, Tokens> = BTreeMap::new();
    for line in body.lines().take_while(|l| !l.trim().is_empty()) {
        let head = fold_accents(line.split('|').next().unwrap_or("").trim());
        if head == "equipo" || head == "patron" {
            sides.insert(head, Tokens::parse(line));
        } else {
            general.extend(line);
        }
    }

    let side = |tokens: &Tokens| -> Option<HydrometerSide> {
        Some(HydrometerSide {
            api: tokens.number("api")?,
            temperature: tokens.temperature("temperatura")?,
            api60f: tokens.number("api 60f")?,
        })
    };
    let result = HydrometerComparison {
        work: side(sides.get("equipo")?)?,
        reference: side(sides.get("patron")?)?,
        diff_api: general.number("diferencia api 60f")?,
    };
    Some((general, result))
}

/// Recover a comparison from notes text; `None` when no complete block is present
pub fn decode(text: &str) -> Option<ComparisonNote> {
    let (kind, body) = locate(text)?;

    if kind == ComparisonKind::Hydrometer {
        let (general, result) = hydrometer_block(body)?;
        return Some(ComparisonNote {
            reference_id: general.raw("patron id")?.to_string(),
            result: ComparisonResult::Hydrometer(result),
        });
    }

    let tokens = Tokens::parse(body);
    let reference_id = tokens.raw("patron id")?.to_string();

    let result = match kind {
        ComparisonKind::Temperature => ComparisonResult::Temperature(TemperatureComparison {
            under: tokens.temperature("lectura equipo")?,
            reference: tokens.temperature("lectura patron")?,
            diff_f: tokens.number("diferencia")?,
        }),
        ComparisonKind::MonthlyTemperature => {
            ComparisonResult::MonthlyTemperature(MonthlyTemperatureComparison {
                high: temperature_point(&tokens, "alto")?,
                mid: temperature_point(&tokens, "medio")?,
                low: temperature_point(&tokens, "bajo")?,
            })
        }
        ComparisonKind::Tape => {
            let (under, under_unit) = tokens.series("lectura equipo")?;
            let (reference, reference_unit) = tokens.series("lectura patron")?;
            ComparisonResult::Tape(TapeComparison {
                under,
                under_unit,
                reference,
                reference_unit,
                avg_under_mm: tokens.number("promedio equipo")?,
                avg_reference_mm: tokens.number("promedio patron")?,
                diff_mm: tokens.number("diferencia (patron-equipo)")?,
            })
        }
        ComparisonKind::Balance => ComparisonResult::Balance(BalanceComparison {
            weight: tokens.mass("pesa")?,
            reading: tokens.mass("lectura balanza")?,
            diff_g: tokens.grams("diferencia (pesa-balanza)")?,
            emp_g: tokens.grams("emp")?,
        }),
        ComparisonKind::KarlFischer => {
            let trial = |n: usize| -> Option<KarlFischerTrial> {
                Some(KarlFischerTrial {
                    weight_mg: tokens.number(&format!("peso {}", n))?,
                    volume_ml: tokens.number(&format!("volumen {}", n))?,
                    factor: tokens.number(&format!("factor {}", n))?,
                })
            };
            ComparisonResult::KarlFischer(KarlFischerComparison {
                trials: [trial(1)?, trial(2)?],
                average_factor: tokens.number("factor promedio")?,
                relative_error_pct: tokens.number("error relativo")?,
            })
        }
        ComparisonKind::Hydrometer => return None,
    };

    Some(ComparisonNote { reference_id, result })
}

/// Difference values of a block, even when other tokens are missing
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyDifferences {
    pub kind: ComparisonKind,
    pub diffs: Vec<f64>,
}

/// Pull only the difference token(s) out of a possibly incomplete block
pub fn decode_differences(text: &str) -> Option<LegacyDifferences> {
    let (kind, body) = locate(text)?;
    let tokens = Tokens::parse(body);
    let diffs = match kind {
        ComparisonKind::Temperature => vec![tokens.number("diferencia")?],
        ComparisonKind::MonthlyTemperature => vec![
            tokens.number("diferencia alto")?,
            tokens.number("diferencia medio")?,
            tokens.number("diferencia bajo")?,
        ],
        ComparisonKind::Tape => vec![tokens.number("diferencia (patron-equipo)")?],
        ComparisonKind::Balance => vec![tokens.grams("diferencia (pesa-balanza)")?],
        ComparisonKind::Hydrometer => {
            let mut general = Tokens::default();
            body.lines().for_each(|l| general.extend(l));
            vec![general.number("diferencia api 60f")?]
        }
        ComparisonKind::KarlFischer => vec![tokens.number("error relativo")?],
    };
    Some(LegacyDifferences { kind, diffs })
}

/// EMP token anywhere in the text, in grams
pub fn find_emp(text: &str) -> Option<f64> {
    let caps = EMP_TOKEN.captures_iter(text).last()?;
    let value = parse_decimal(caps.get(1)?.as_str())?;
    let unit = caps
        .get(2)
        .and_then(|m| MassUnit::parse(m.as_str()))
        .unwrap_or(MassUnit::G);
    Some(unit.to_grams(value)).filter(|v| *v > 0.0)
}

/// Notes text with any comparison block removed
pub fn strip_block(text: &str) -> String {
    if let Some(pos) = text.lines().position(is_sentinel) {
        return text.lines().take(pos).collect::<Vec<_>>().join("\n").trim().to_string();
    }
    match BLOCK_MARKER.find_iter(text).last() {
        Some(m) => {
            let head = &text[..m.start()];
            let tail = text[m.end()..].split_once('\n').map(|(_, t)| t).unwrap_or("");
            format!("{}{}", head, tail).trim().to_string()
        }
        None => text.trim().to_string(),
    }
}
