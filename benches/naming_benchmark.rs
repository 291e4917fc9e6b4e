use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::path::Path;

use media_renamer::config::Config;
use media_renamer::exif::MetadataRecord;
use media_renamer::file_ops::{FileSystem, Renamer};
use media_renamer::layout::Layout;
use media_renamer::naming::{derive_stem, derive_stem_with};

const SAMPLES: &[(&str, &str)] = &[
    ("2006:01:02 15:04:05", "2019:08:05 14:12:13"),
    ("2006:01:02 15:04:05-07:00", "2015:07:15 13:56:17+02:00"),
    ("2006:01:02 15:04:05.000", "2021:12:31 23:59:59.123"),
    ("Jan 2, 2006 at 3:04pm", "Aug 5, 2019 at 2:12pm"),
];

/// Renames nothing; only the resolver is measured.
struct NullFileSystem;

impl FileSystem for NullFileSystem {
    fn rename(&self, _from: &Path, _to: &Path) -> std::io::Result<()> {
        Ok(())
    }
}

fn bench_derive_stem(c: &mut Criterion) {
    let mut group = c.benchmark_group("derive_stem");

    for (layout, value) in SAMPLES {
        group.bench_with_input(BenchmarkId::new("compile_and_parse", layout), value, |b, value| {
            b.iter(|| derive_stem(black_box(layout), black_box(value)))
        });

        // Layouts are compiled once per call in the resolver; this is the floor.
        let compiled = Layout::parse(layout).unwrap();
        group.bench_with_input(BenchmarkId::new("precompiled", layout), value, |b, value| {
            b.iter(|| derive_stem_with(black_box(&compiled), black_box(value)))
        });
    }

    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let config = Config::bundled().unwrap();
    let renamer = Renamer::new(&config, NullFileSystem);

    let photo = MetadataRecord::new("DCIM/IMG_0001.JPG")
        .with_field("Model", "X100V")
        .with_field("CreateDate", "2019:08:05 14:12:13");
    let video = MetadataRecord::new("DCIM/MVI_0002.MOV")
        .with_field("MediaCreateDate", "2015:07:15 11:56:17");

    c.bench_function("resolve_photo_fallback", |b| {
        b.iter(|| renamer.resolve(black_box(Path::new("DCIM/IMG_0001.JPG")), black_box(&photo)))
    });
    c.bench_function("resolve_video_fallback", |b| {
        b.iter(|| renamer.resolve(black_box(Path::new("DCIM/MVI_0002.MOV")), black_box(&video)))
    });
}

criterion_group!(benches, bench_derive_stem, bench_resolve);
criterion_main!(benches);
