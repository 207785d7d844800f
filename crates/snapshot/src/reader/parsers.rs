//! Library of parser functions for the text formats

// external crates
use nom::character::complete::space0;
use nom::multi::many1;
use nom::number::complete::double;
use nom::sequence::{preceded, terminated};
use nom::IResult;

/// Parse any number of consecutive doubles into a vector of f64 values
pub fn vector_of_f64(i: &str) -> IResult<&str, Vec<f64>> {
    many1(terminated(double, space0))(i.trim_start())
}

/// Parse any number of consecutive integers into a vector of i32 values
pub fn vector_of_i32(i: &str) -> IResult<&str, Vec<i32>> {
    many1(terminated(
        nom::character::complete::i32,
        space0,
    ))(i.trim_start())
}

/// Parse the `it time ndim neqpar nw` parameter line of an ascii header
///
/// The time may be written in any float format, everything else is a plain
/// signed integer. A negative `ndim` flags generalised coordinates and is
/// passed through untouched.
pub fn ascii_params(i: &str) -> IResult<&str, (i32, f64, i32, i32, i32)> {
    let (i, it) = preceded(space0, nom::character::complete::i32)(i)?;
    let (i, time) = preceded(space0, double)(i)?;
    let (i, ndim) = preceded(space0, nom::character::complete::i32)(i)?;
    let (i, neqpar) = preceded(space0, nom::character::complete::i32)(i)?;
    let (i, nw) = preceded(space0, nom::character::complete::i32)(i)?;
    Ok((i, (it, time, ndim, neqpar, nw)))
}

/// Check that every whitespace-separated token on the line is numeric
pub fn is_double_list(i: &str) -> bool {
    match vector_of_f64(i) {
        Ok((rest, _)) => rest.trim().is_empty(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod parser_tests {
    use super::*;

    #[test]
    fn params_line_positive() {
        let (_, (it, time, ndim, neqpar, nw)) = ascii_params("      10   0.2300E+01 1 2 8").unwrap();
        assert_eq!(it, 10);
        assert_eq!(time, 2.3);
        assert_eq!(ndim, 1);
        assert_eq!(neqpar, 2);
        assert_eq!(nw, 8);
    }

    #[test]
    fn params_line_gencoord() {
        let (_, (_, _, ndim, _, _)) = ascii_params("0 0.0 -2 0 4").unwrap();
        assert_eq!(ndim, -2);
    }

    #[test]
    fn float_vectors() {
        let (_, values) = vector_of_f64("  1.0 2.5e-1 -3").unwrap();
        assert_eq!(values, vec![1.0, 0.25, -3.0]);
    }

    #[test]
    fn integer_vectors() {
        let (_, values) = vector_of_i32("  100 50 2").unwrap();
        assert_eq!(values, vec![100, 50, 2]);
    }

    #[test]
    fn double_list_check() {
        assert!(is_double_list("1.0 2.0 3.0e-2"));
        assert!(!is_double_list("rho m1 m2 e"));
        assert!(!is_double_list("1.0 2.0 then text"));
    }
}
