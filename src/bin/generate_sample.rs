use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use serde_json::json;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

const STATES: [(&str, &str, [&str; 3]); 4] = [
    ("01", "Alabama", ["Autauga", "Baldwin", "Barbour"]),
    ("06", "California", ["Alameda", "Alpine", "Amador"]),
    ("42", "Pennsylvania", ["Adams", "Allegheny", "Armstrong"]),
    ("53", "Washington", ["Asotin", "Benton", "Chelan"]),
];
const DAYS: usize = 180;

/// Cumulative logistic outbreak curve with a little noise, forced monotone.
fn county_curve(rng: &mut SimpleRng) -> Vec<i64> {
    let capacity = 2_000.0 + rng.next_f64() * 20_000.0;
    let midpoint = 40.0 + rng.next_f64() * 80.0;
    let steepness = 0.05 + rng.next_f64() * 0.08;

    let mut running_max = 0i64;
    (0..DAYS)
        .map(|day| {
            let expected = capacity / (1.0 + (-steepness * (day as f64 - midpoint)).exp());
            let value = (expected + rng.gauss(0.0, expected * 0.02)).max(0.0) as i64;
            running_max = running_max.max(value);
            running_max
        })
        .collect()
}

/// Deaths lag cases by two weeks at a per-county fatality rate.
fn death_curve(cases: &[i64], rng: &mut SimpleRng) -> Vec<i64> {
    let rate = 0.01 + rng.next_f64() * 0.03;
    (0..cases.len())
        .map(|day| {
            let lagged = if day >= 14 { cases[day - 14] } else { 0 };
            (lagged as f64 * rate) as i64
        })
        .collect()
}

/// A closed rectangular ring.
fn rect_ring(lon: f64, lat: f64, width: f64, height: f64) -> Vec<[f64; 2]> {
    vec![
        [lon, lat],
        [lon + width, lat],
        [lon + width, lat + height],
        [lon, lat + height],
        [lon, lat],
    ]
}

fn feature(properties: serde_json::Value, ring: Vec<[f64; 2]>) -> serde_json::Value {
    json!({
        "type": "Feature",
        "properties": properties,
        "geometry": {"type": "Polygon", "coordinates": [ring]}
    })
}

fn write_geojson(path: &Path, features: Vec<serde_json::Value>) {
    let collection = json!({"type": "FeatureCollection", "features": features});
    std::fs::write(path, serde_json::to_string_pretty(&collection).unwrap())
        .expect("Failed to write GeoJSON");
}

fn main() {
    let mut rng = SimpleRng::new(42);
    let out_dir = Path::new("data");
    std::fs::create_dir_all(out_dir).expect("Failed to create data directory");

    let start = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
    let dates: Vec<NaiveDate> = (0..DAYS as i64)
        .map(|offset| start + chrono::Duration::days(offset))
        .collect();

    // ---- Case curves per county, aggregated upward ----
    let mut county_rows: Vec<(String, String, String, Vec<i64>, Vec<i64>)> = Vec::new();
    for (state_fips, state_name, counties) in STATES {
        for (i, county_name) in counties.iter().enumerate() {
            let fips = format!("{state_fips}{:03}", 2 * i + 1);
            let cases = county_curve(&mut rng);
            let deaths = death_curve(&cases, &mut rng);
            county_rows.push((
                fips,
                county_name.to_string(),
                state_name.to_string(),
                cases,
                deaths,
            ));
        }
    }

    let mut state_totals: BTreeMap<&str, (Vec<i64>, Vec<i64>)> = BTreeMap::new();
    for (fips, _, _, cases, deaths) in &county_rows {
        let entry = state_totals
            .entry(STATES.iter().find(|s| fips.starts_with(s.0)).unwrap().0)
            .or_insert_with(|| (vec![0; DAYS], vec![0; DAYS]));
        for day in 0..DAYS {
            entry.0[day] += cases[day];
            entry.1[day] += deaths[day];
        }
    }

    let mut country_cases = vec![0i64; DAYS];
    let mut country_deaths = vec![0i64; DAYS];
    for (cases, deaths) in state_totals.values() {
        for day in 0..DAYS {
            country_cases[day] += cases[day];
            country_deaths[day] += deaths[day];
        }
    }

    // ---- CSVs, one file per granularity level ----
    let mut counties_csv =
        csv::Writer::from_path(out_dir.join("us-counties.csv")).expect("Failed to open CSV");
    counties_csv
        .write_record(["date", "county", "state", "fips", "cases", "deaths"])
        .unwrap();
    for (day, date) in dates.iter().enumerate() {
        for (fips, county, state, cases, deaths) in &county_rows {
            counties_csv
                .write_record([
                    &date.to_string(),
                    county,
                    state,
                    fips,
                    &cases[day].to_string(),
                    &deaths[day].to_string(),
                ])
                .unwrap();
        }
    }
    counties_csv.flush().unwrap();

    let mut states_csv =
        csv::Writer::from_path(out_dir.join("us-states.csv")).expect("Failed to open CSV");
    states_csv
        .write_record(["date", "state", "fips", "cases", "deaths"])
        .unwrap();
    for (day, date) in dates.iter().enumerate() {
        for (state_fips, state_name, _) in STATES {
            let (cases, deaths) = &state_totals[state_fips];
            states_csv
                .write_record([
                    date.to_string(),
                    state_name.to_string(),
                    state_fips.to_string(),
                    cases[day].to_string(),
                    deaths[day].to_string(),
                ])
                .unwrap();
        }
    }
    states_csv.flush().unwrap();

    let mut country_csv =
        csv::Writer::from_path(out_dir.join("us.csv")).expect("Failed to open CSV");
    country_csv.write_record(["date", "cases", "deaths"]).unwrap();
    for (day, date) in dates.iter().enumerate() {
        country_csv
            .write_record([
                &date.to_string(),
                &country_cases[day].to_string(),
                &country_deaths[day].to_string(),
            ])
            .unwrap();
    }
    country_csv.flush().unwrap();

    // ---- Boundary files: a grid of squares, three strips per state ----
    let mut state_features = Vec::new();
    let mut county_features = Vec::new();
    for (i, (state_fips, state_name, counties)) in STATES.iter().enumerate() {
        let lon = -120.0 + (i % 2) as f64 * 8.0;
        let lat = 32.0 + (i / 2) as f64 * 6.0;
        state_features.push(feature(
            json!({"STATE": state_fips, "NAME": state_name}),
            rect_ring(lon, lat, 6.0, 4.0),
        ));
        for (j, county_name) in counties.iter().enumerate() {
            county_features.push(feature(
                json!({
                    "STATE": state_fips,
                    "COUNTY": format!("{:03}", 2 * j + 1),
                    "NAME": county_name,
                }),
                rect_ring(lon + j as f64 * 2.0, lat, 2.0, 4.0),
            ));
        }
    }
    write_geojson(&out_dir.join("us-states.geojson"), state_features);
    write_geojson(&out_dir.join("us-counties.geojson"), county_features);

    println!(
        "Wrote {} county rows across {} days to {}",
        county_rows.len() * DAYS,
        DAYS,
        out_dir.display()
    );
}
