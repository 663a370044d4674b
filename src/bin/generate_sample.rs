use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde_json::json;

const PARTICIPANTS: usize = 120;
const SUBTESTS: [&str; 6] = ["PU", "PK", "PPU", "PBM", "LIND", "LING"];
const PROGRAMMES: [(&str, &str); 6] = [
    ("SAINTEK", "TEKNIK INFORMATIKA"),
    ("SAINTEK", "KEDOKTERAN"),
    ("SAINTEK", "MATEMATIKA"),
    ("SOSHUM", "MANAJEMEN"),
    ("SOSHUM", "ILMU HUKUM"),
    ("SOSHUM", "PSIKOLOGI"),
];

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

/// One synthetic tryout participant.
struct Participant {
    tryouts: [i64; 7],
    avg_4_to_7: f64,
    estimate: f64,
    average: f64,
    ranking: Option<i64>,
    rumpun: &'static str,
    programme: &'static str,
    scores: [f64; 6],
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

fn generate(rng: &mut SimpleRng) -> Vec<Participant> {
    let mut people: Vec<Participant> = (0..PARTICIPANTS)
        .map(|i| {
            let ability = rng.gauss(0.0, 1.0);
            let mut tryouts = [0i64; 7];
            for (t, slot) in tryouts.iter_mut().enumerate() {
                *slot = rng.gauss(480.0 + 6.0 * t as f64 + 60.0 * ability, 20.0).round() as i64;
            }
            let avg_4_to_7 = round2(mean(tryouts[3..].iter().map(|&v| v as f64)));
            let average = round2(mean(tryouts.iter().map(|&v| v as f64)));
            let (rumpun, programme) = PROGRAMMES[i % PROGRAMMES.len()];
            let bonus = if rumpun == "SAINTEK" { 8.0 } else { -4.0 };

            let mut scores = [0.0; 6];
            for (k, score) in scores.iter_mut().enumerate() {
                *score = round2(rng.gauss(average + bonus + 3.0 * k as f64, 15.0));
            }

            Participant {
                tryouts,
                avg_4_to_7,
                estimate: round2(avg_4_to_7 + 12.0),
                average,
                ranking: None,
                rumpun,
                programme,
                scores,
            }
        })
        .collect();

    // Rank by average, best first; every 17th participant has no ranking.
    let mut order: Vec<usize> = (0..people.len()).collect();
    order.sort_by(|&a, &b| people[b].average.total_cmp(&people[a].average));
    for (rank, &idx) in order.iter().enumerate() {
        people[idx].ranking = (idx % 17 != 16).then_some(rank as i64 + 1);
    }
    people
}

/// Standardise the numeric features and regress each subtest on the overall
/// average, with a per-group offset.
fn fit_pipeline(people: &[Participant]) -> serde_json::Value {
    let numeric: Vec<(&str, Vec<f64>)> = {
        let mut cols: Vec<(&str, Vec<f64>)> = (0..7)
            .map(|t| {
                let name = ["TO 1", "TO 2", "TO 3", "TO 4", "TO 5", "TO 6", "TO 7"][t];
                (name, people.iter().map(|p| p.tryouts[t] as f64).collect())
            })
            .collect();
        cols.push(("RATA- RATA TO 4 S.D 7", people.iter().map(|p| p.avg_4_to_7).collect()));
        cols.push(("ESTIMASI RATA-RATA", people.iter().map(|p| p.estimate).collect()));
        cols.push(("Rata-rata", people.iter().map(|p| p.average).collect()));
        cols.push((
            "Ranking",
            people.iter().filter_map(|p| p.ranking).map(|r| r as f64).collect(),
        ));
        cols
    };

    let mut steps = Vec::new();
    let mut avg_stats = (0.0, 1.0);
    for (name, values) in &numeric {
        let m = mean(values.iter().copied());
        let sd = mean(values.iter().map(|v| (v - m).powi(2))).sqrt();
        if *name == "Rata-rata" {
            avg_stats = (m, sd);
        }
        steps.push(json!({ "kind": "numeric", "column": name, "mean": m, "scale": sd }));
    }
    steps.push(json!({
        "kind": "one_hot",
        "column": "RUMPUN",
        "categories": ["SAINTEK", "SOSHUM"],
    }));
    let programmes: Vec<&str> = PROGRAMMES.iter().map(|(_, p)| *p).collect();
    steps.push(json!({ "kind": "one_hot", "column": "JURUSAN/PRODI", "categories": programmes }));

    let avg_pos = numeric
        .iter()
        .position(|(n, _)| *n == "Rata-rata")
        .unwrap_or(0);
    let width = numeric.len() + 2 + programmes.len();

    let mut coefficients = Vec::new();
    let mut intercepts = Vec::new();
    for k in 0..SUBTESTS.len() {
        let y_mean = mean(people.iter().map(|p| p.scores[k]));
        let cov = mean(
            people
                .iter()
                .map(|p| (p.average - avg_stats.0) * (p.scores[k] - y_mean)),
        );
        let slope = cov / avg_stats.1;
        let group_offset = |group: &str| {
            let residual = people
                .iter()
                .filter(|p| p.rumpun == group)
                .map(|p| p.scores[k] - y_mean - slope * (p.average - avg_stats.0) / avg_stats.1);
            mean(residual)
        };

        let mut row = vec![0.0; width];
        row[avg_pos] = slope;
        row[numeric.len()] = group_offset("SAINTEK");
        row[numeric.len() + 1] = group_offset("SOSHUM");

        coefficients.push(row);
        intercepts.push(y_mean);
    }

    json!({
        "steps": steps,
        "regressor": { "coefficients": coefficients, "intercepts": intercepts },
    })
}

fn write_csv(people: &[Participant], path: &str) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    writer.write_record([
        "NAMA", "TO 1", "TO 2", "TO 3", "TO 4", "TO 5", "TO 6", "TO 7",
        "RATA- RATA TO 4 S.D 7", "ESTIMASI RATA-RATA", "Rata-rata", "Ranking",
        "RUMPUN", "JURUSAN/PRODI",
    ])?;
    for (i, p) in people.iter().enumerate() {
        let mut record = vec![format!("PESERTA {:03}", i + 1)];
        record.extend(p.tryouts.iter().map(|v| v.to_string()));
        record.push(p.avg_4_to_7.to_string());
        record.push(p.estimate.to_string());
        record.push(p.average.to_string());
        record.push(p.ranking.map(|r| r.to_string()).unwrap_or_default());
        record.push(p.rumpun.to_string());
        record.push(p.programme.to_string());
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_cleaned_csv(people: &[Participant], path: &str) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    let mut header = vec!["JURUSAN/PRODI"];
    header.extend(SUBTESTS);
    writer.write_record(&header)?;
    for p in people {
        let mut record = vec![p.programme.to_string()];
        record.extend(p.scores.iter().map(|v| v.to_string()));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(people: &[Participant], path: &str) -> Result<()> {
    let mut fields = Vec::new();
    let mut arrays: Vec<ArrayRef> = Vec::new();
    for t in 0..7 {
        fields.push(Field::new(format!("TO {}", t + 1), DataType::Int64, false));
        arrays.push(Arc::new(Int64Array::from(
            people.iter().map(|p| p.tryouts[t]).collect::<Vec<_>>(),
        )));
    }
    let averages: [(&str, fn(&Participant) -> f64); 3] = [
        ("RATA- RATA TO 4 S.D 7", |p| p.avg_4_to_7),
        ("ESTIMASI RATA-RATA", |p| p.estimate),
        ("Rata-rata", |p| p.average),
    ];
    for (name, get) in averages {
        fields.push(Field::new(name, DataType::Float64, false));
        arrays.push(Arc::new(Float64Array::from(
            people.iter().map(get).collect::<Vec<_>>(),
        )));
    }
    fields.push(Field::new("Ranking", DataType::Int64, true));
    arrays.push(Arc::new(Int64Array::from(
        people.iter().map(|p| p.ranking).collect::<Vec<_>>(),
    )));
    fields.push(Field::new("RUMPUN", DataType::Utf8, false));
    arrays.push(Arc::new(StringArray::from(
        people.iter().map(|p| p.rumpun).collect::<Vec<_>>(),
    )));
    fields.push(Field::new("JURUSAN/PRODI", DataType::Utf8, false));
    arrays.push(Arc::new(StringArray::from(
        people.iter().map(|p| p.programme).collect::<Vec<_>>(),
    )));

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), arrays).context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let people = generate(&mut rng);

    write_csv(&people, "nilai_utbk_sample.csv")?;
    write_parquet(&people, "nilai_utbk_sample.parquet")?;
    write_cleaned_csv(&people, "nilai_utbk_cleaned.csv")?;

    let artifact = fit_pipeline(&people);
    std::fs::write("model_pipeline.json", serde_json::to_vec_pretty(&artifact)?)
        .context("writing model_pipeline.json")?;

    println!(
        "Wrote {} participants to nilai_utbk_sample.{{csv,parquet}}, \
         nilai_utbk_cleaned.csv and model_pipeline.json",
        people.len()
    );
    Ok(())
}
