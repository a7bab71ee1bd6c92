use crate::types::{Workout, WorkoutSummary};
use anyhow::Result;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::Cursor;

const GPX_NS: &str = "http://www.topografix.com/GPX/1/1";

/// Renders every workout as a GPX 1.1 waypoint, in store order.
pub fn write_waypoints(workouts: &[Workout]) -> Result<String> {
    let mut xml = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    xml.write_event(Event::Start(BytesStart::new("gpx").with_attributes([
        ("version", "1.1"),
        ("creator", "mapty"),
        ("xmlns", GPX_NS),
    ])))?;

    for w in workouts {
        write_waypoint(&mut xml, w)?;
    }

    xml.write_event(Event::End(BytesEnd::new("gpx")))?;

    let bytes = xml.into_inner().into_inner();
    crate::dlog!("gpx export waypoints={} bytes={}", workouts.len(), bytes.len());
    Ok(String::from_utf8(bytes)?)
}

fn write_waypoint(xml: &mut Writer<Cursor<Vec<u8>>>, w: &Workout) -> Result<()> {
    let lat = w.coordinates().lat().to_string();
    let lon = w.coordinates().lng().to_string();
    xml.write_event(Event::Start(
        BytesStart::new("wpt").with_attributes([("lat", lat.as_str()), ("lon", lon.as_str())]),
    ))?;

    let s = WorkoutSummary::from(w);
    text_element(xml, "time", &w.created_at().to_rfc3339())?;
    text_element(xml, "name", w.describe())?;
    text_element(
        xml,
        "desc",
        &format!(
            "{} km, {} min, {:.1} {}, {} {}",
            s.distance_km, s.duration_min, s.metric, s.metric_unit, s.detail, s.detail_unit
        ),
    )?;
    text_element(xml, "type", w.kind().as_str())?;

    xml.write_event(Event::End(BytesEnd::new("wpt")))?;
    Ok(())
}

fn text_element(xml: &mut Writer<Cursor<Vec<u8>>>, name: &str, text: &str) -> Result<()> {
    xml.write_event(Event::Start(BytesStart::new(name)))?;
    xml.write_event(Event::Text(BytesText::new(text)))?;
    xml.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Coordinates;
    use chrono::{Local, TimeZone, Utc};
    use quick_xml::reader::Reader;

    #[test]
    fn one_waypoint_per_workout_with_coordinates() {
        let at = Local
            .with_ymd_and_hms(2024, 4, 14, 9, 30, 0)
            .unwrap()
            .with_timezone(&Utc);
        let workouts = vec![
            Workout::running(Coordinates::new(10.0, 20.0).unwrap(), 5.0, 25.0, 180.0, at).unwrap(),
            Workout::cycling(Coordinates::new(-33.9, 18.4).unwrap(), 20.0, 60.0, 150.0, at).unwrap(),
        ];

        let doc = write_waypoints(&workouts).unwrap();
        assert!(doc.starts_with("<?xml"));
        assert!(doc.contains("<name>running on April 14</name>"));
        assert!(doc.contains("<type>cycling</type>"));

        let mut reader = Reader::from_str(&doc);
        let mut lats = Vec::new();
        loop {
            match reader.read_event().unwrap() {
                Event::Eof => break,
                Event::Start(e) if e.name().as_ref() == b"wpt" => {
                    for a in e.attributes().flatten() {
                        if a.key.as_ref() == b"lat" {
                            lats.push(a.unescape_value().unwrap().parse::<f64>().unwrap());
                        }
                    }
                }
                _ => {}
            }
        }
        assert_eq!(lats, vec![10.0, -33.9]);
    }

    #[test]
    fn empty_store_still_yields_a_document() {
        let doc = write_waypoints(&[]).unwrap();
        assert!(doc.contains("<gpx"));
        assert!(!doc.contains("<wpt"));
    }
}
