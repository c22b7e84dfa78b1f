//! Units Module
//! 
//! Measurement-unit conversions and the reference-weight EMP table.

pub mod convert;
pub mod emp;

pub use convert::{
    parse_decimal, to_fahrenheit, to_grams, to_millimeters, LengthUnit, MassUnit,
    Measured, TemperatureUnit,
};
pub use emp::{get_weight_emp, get_weight_emp_str, WeightClass};
