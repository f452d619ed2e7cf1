// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! WKT reader/writer using nom
//!
//! Supports the geometry types found in floor datasets: POINT, LINESTRING,
//! POLYGON, MULTILINESTRING and MULTIPOLYGON. A Z/M/ZM dimension tag is
//! accepted and extra ordinates are dropped.

use nom::{
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::{char, multispace0, multispace1},
    combinator::{all_consuming, map, opt},
    multi::separated_list1,
    number::complete::double,
    sequence::{delimited, preceded, tuple},
    IResult,
};

use crate::error::{Error, Result};
use crate::geom::{Geometry, Line2D, Point2D, Polygon2D};

/// Wrap a parser with optional surrounding whitespace
fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Wrap a parser in parentheses
fn parens<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(ws(char('(')), inner, ws(char(')')))
}

/// Parse coordinate: "x y", "x y z" or "x y z m"
fn coord(input: &str) -> IResult<&str, Point2D> {
    map(
        tuple((
            double,
            preceded(multispace1, double),
            opt(preceded(multispace1, double)),
            opt(preceded(multispace1, double)),
        )),
        |(x, y, _, _)| Point2D::new(x, y),
    )(input)
}

/// Parse comma-separated coordinates: "x y, x y, ..."
fn coord_list(input: &str) -> IResult<&str, Vec<Point2D>> {
    separated_list1(ws(char(',')), ws(coord))(input)
}

/// Parse a ring or line body: "(x y, x y, ...)"
fn ring(input: &str) -> IResult<&str, Vec<Point2D>> {
    parens(coord_list)(input)
}

/// Parse a polygon body: "((outer), (hole), ...)"
fn polygon_body(input: &str) -> IResult<&str, Polygon2D> {
    map(parens(separated_list1(ws(char(',')), ring)), |mut rings| {
        let outer = rings.remove(0);
        Polygon2D::with_holes(outer, rings)
    })(input)
}

/// Optional dimension tag after the type keyword. The keyword parser has
/// already eaten the separating whitespace.
fn dimension(input: &str) -> IResult<&str, Option<&str>> {
    opt(alt((tag_no_case("ZM"), tag_no_case("Z"), tag_no_case("M"))))(input)
}

fn tagged<'a, F, O>(keyword: &'static str, body: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    preceded(tuple((ws(tag_no_case(keyword)), dimension)), body)
}

fn geometry(input: &str) -> IResult<&str, Geometry> {
    alt((
        map(
            tagged("MULTIPOLYGON", parens(separated_list1(ws(char(',')), polygon_body))),
            Geometry::MultiPolygon,
        ),
        map(
            tagged("MULTILINESTRING", parens(separated_list1(ws(char(',')), ring))),
            Geometry::MultiLineString,
        ),
        map(tagged("POLYGON", polygon_body), Geometry::Polygon),
        map(tagged("LINESTRING", ring), Geometry::LineString),
        map(tagged("POINT", parens(ws(coord))), Geometry::Point),
    ))(input)
}

/// Parse a WKT string into a [`Geometry`].
///
/// `EMPTY` geometries are reported as [`Error::Degenerate`] so callers can
/// skip them like any other unusable record.
pub fn parse_wkt(input: &str) -> Result<Geometry> {
    let trimmed = input.trim();
    if trimmed.to_ascii_uppercase().ends_with("EMPTY") {
        return Err(Error::Degenerate(format!("empty geometry: {}", trimmed)));
    }

    match all_consuming(ws(geometry))(trimmed) {
        Ok((_, geom)) => Ok(geom),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(Error::Wkt {
            offset: trimmed.len() - e.input.len(),
            message: format!("unexpected input near {:?}", preview(e.input)),
        }),
        Err(nom::Err::Incomplete(_)) => Err(Error::Wkt {
            offset: trimmed.len(),
            message: "incomplete input".to_string(),
        }),
    }
}

fn preview(s: &str) -> &str {
    match s.char_indices().nth(24) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// ============================================================================
// Writer
// ============================================================================

fn write_coords(out: &mut String, points: &[Point2D], close: bool) {
    out.push('(');
    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&format!("{} {}", p.x, p.y));
    }
    if close && !points.is_empty() {
        out.push_str(&format!(", {} {}", points[0].x, points[0].y));
    }
    out.push(')');
}

fn write_polygon_body(out: &mut String, poly: &Polygon2D) {
    out.push('(');
    write_coords(out, &poly.outer, true);
    for hole in &poly.holes {
        out.push_str(", ");
        write_coords(out, hole, true);
    }
    out.push(')');
}

/// Serialize a geometry to WKT. Numbers use the shortest round-trip form.
pub fn to_wkt(geometry: &Geometry) -> String {
    let mut out = String::from(geometry.type_name());
    out.push(' ');
    match geometry {
        Geometry::Point(p) => out.push_str(&format!("({} {})", p.x, p.y)),
        Geometry::LineString(points) => write_coords(&mut out, points, false),
        Geometry::Polygon(poly) => write_polygon_body(&mut out, poly),
        Geometry::MultiLineString(lines) => {
            out.push('(');
            for (i, line) in lines.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_coords(&mut out, line, false);
            }
            out.push(')');
        }
        Geometry::MultiPolygon(polys) => {
            out.push('(');
            for (i, poly) in polys.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_polygon_body(&mut out, poly);
            }
            out.push(')');
        }
    }
    out
}

/// Shorthand for a polygon.
pub fn polygon_to_wkt(poly: &Polygon2D) -> String {
    to_wkt(&Geometry::Polygon(poly.clone()))
}

/// Shorthand for a two-point line.
pub fn line_to_wkt(line: &Line2D) -> String {
    to_wkt(&Geometry::LineString(vec![line.start, line.end]))
}

/// Parse WKT that must be a single polygon.
pub fn parse_polygon(input: &str) -> Result<Polygon2D> {
    match parse_wkt(input)? {
        Geometry::Polygon(p) => Ok(p),
        other => Err(Error::UnsupportedGeometry(format!(
            "expected POLYGON, found {}",
            other.type_name()
        ))),
    }
}

/// Parse WKT that must be a two-point line.
pub fn parse_line(input: &str) -> Result<Line2D> {
    match parse_wkt(input)? {
        Geometry::LineString(points) if points.len() >= 2 => {
            Ok(Line2D::new(points[0], points[points.len() - 1]))
        }
        other => Err(Error::UnsupportedGeometry(format!(
            "expected LINESTRING with two points, found {}",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_polygon() {
        let geom = parse_wkt("POLYGON ((0 0, 5 0, 5 0.2, 0 0.2, 0 0))").unwrap();
        match geom {
            Geometry::Polygon(p) => {
                assert_eq!(p.outer.len(), 4);
                assert_eq!(p.outer[2], Point2D::new(5.0, 0.2));
                assert!(p.holes.is_empty());
            }
            other => panic!("expected polygon, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_polygon_with_hole_and_z() {
        let geom = parse_wkt(
            "polygon z ((0 0 1, 4 0 1, 4 4 1, 0 4 1, 0 0 1), (1 1 1, 2 1 1, 2 2 1, 1 1 1))",
        )
        .unwrap();
        let polys = geom.polygons();
        assert_eq!(polys.len(), 1);
        assert_eq!(polys[0].holes.len(), 1);
        assert_eq!(polys[0].holes[0].len(), 3);
    }

    #[test]
    fn test_parse_dimension_tags() {
        let geom = parse_wkt("LINESTRING M (0 0 7, 2 0 8)").unwrap();
        assert_eq!(geom.lines()[0][1], Point2D::new(2.0, 0.0));

        let geom = parse_wkt("POINT ZM (1 2 3 4)").unwrap();
        assert_eq!(geom, Geometry::Point(Point2D::new(1.0, 2.0)));

        let geom =
            parse_wkt("MULTIPOLYGON Z (((0 0 0, 1 0 0, 1 1 0, 0 0 0)))").unwrap();
        assert_eq!(geom.polygons().len(), 1);

        let geom = parse_wkt("POLYGON Z((0 0 1, 4 0 1, 4 4 1, 0 0 1))").unwrap();
        assert_eq!(geom.polygons()[0].outer.len(), 3);
    }

    #[test]
    fn test_parse_multipolygon_and_lines() {
        let geom =
            parse_wkt("MULTIPOLYGON (((0 0, 1 0, 1 1, 0 0)), ((2 2, 3 2, 3 3, 2 2)))").unwrap();
        assert_eq!(geom.polygons().len(), 2);

        let geom = parse_wkt("LINESTRING (0 0, 3.5 -1e-3)").unwrap();
        assert_eq!(geom.lines()[0][1], Point2D::new(3.5, -0.001));

        let geom = parse_wkt("MULTILINESTRING ((0 0, 1 0), (0 1, 1 1))").unwrap();
        assert_eq!(geom.lines().len(), 2);

        let geom = parse_wkt("POINT (1 2)").unwrap();
        assert_eq!(geom, Geometry::Point(Point2D::new(1.0, 2.0)));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_wkt("POLYGON EMPTY"),
            Err(Error::Degenerate(_))
        ));
        assert!(matches!(
            parse_wkt("POLYGON ((0 0, 1 0, 1 1"),
            Err(Error::Wkt { .. })
        ));
        assert!(matches!(parse_wkt("CIRCLE (0 0, 1)"), Err(Error::Wkt { .. })));
        assert!(matches!(
            parse_polygon("LINESTRING (0 0, 1 1)"),
            Err(Error::UnsupportedGeometry(_))
        ));
    }

    #[test]
    fn test_writer_round_trip() {
        let poly = Polygon2D::rectangle(0.1, -0.1, 5.3, 0.1);
        let text = polygon_to_wkt(&poly);
        assert!(text.starts_with("POLYGON ((0.1 -0.1, 5.3 -0.1"));
        assert_eq!(parse_polygon(&text).unwrap(), poly);

        let line = Line2D::new(Point2D::new(-0.2, 0.0), Point2D::new(5.2, 1.0 / 3.0));
        assert_eq!(parse_line(&line_to_wkt(&line)).unwrap(), line);
    }
}
