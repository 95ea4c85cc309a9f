//! Shared fixture writers for integration tests
//!
//! Builds small but well-formed CRAM files plus matching BAI and CRAI
//! indices in memory or in temporary files.

#![allow(dead_code)]

use cram_seek::core::VirtualOffset;
use cram_seek::formats::block::{Block, ContentType};
use cram_seek::formats::{write_file_header, ContainerHeader, FileDefinition, Version};
use flate2::write::GzEncoder;
use flate2::Compression;
use noodles::bam::bai;
use noodles::bgzf::VirtualPosition;
use noodles::core::Position;
use noodles::cram::crai;
use noodles::csi::binning_index::index::reference_sequence::bin::Chunk;
use noodles::csi::binning_index::index::reference_sequence::index::LinearIndex;
use noodles::csi::binning_index::Indexer;
use noodles::sam;
use noodles::sam::header::record::value::{map::ReferenceSequence, Map};
use std::io::Write;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const V3: Version = Version::new(3, 0);
pub const V2: Version = Version::new(2, 1);

/// Genomic extent of one data container
#[derive(Debug, Clone, Copy)]
pub struct ContainerLayout {
    pub reference_id: i32,
    pub start: i32,
    pub span: i32,
    pub records: i32,
}

impl ContainerLayout {
    pub fn mapped(reference_id: i32, start: i32, span: i32) -> Self {
        Self {
            reference_id,
            start,
            span,
            records: 10,
        }
    }

    pub fn unmapped() -> Self {
        Self {
            reference_id: -1,
            start: 0,
            span: 0,
            records: 5,
        }
    }
}

/// A CRAM file in memory
pub struct CramFixture {
    pub bytes: Vec<u8>,
    pub data_offset: u64,
    /// Offset of each data container, in file order
    pub offsets: Vec<u64>,
    pub sizes: Vec<u64>,
    pub layouts: Vec<ContainerLayout>,
}

fn reference_sequence(length: usize) -> Map<ReferenceSequence> {
    Map::<ReferenceSequence>::new(NonZeroUsize::new(length).unwrap())
}

/// chr1 (1 Mb) and chr2 (500 kb)
pub fn sam_header() -> sam::Header {
    sam::Header::builder()
        .add_reference_sequence("chr1", reference_sequence(1_000_000))
        .add_reference_sequence("chr2", reference_sequence(500_000))
        .build()
}

/// Write a file definition, header container, the given data containers
/// and the EOF container
pub fn build_cram(version: Version, layouts: &[ContainerLayout]) -> CramFixture {
    let sam = sam_header();
    let mut bytes = Vec::new();
    let data_offset = write_file_header(&mut bytes, &FileDefinition::new(version), &sam).unwrap();

    let mut offsets = Vec::new();
    let mut sizes = Vec::new();
    for layout in layouts {
        let offset = bytes.len() as u64;
        write_container(
            &mut bytes,
            version,
            ContainerHeader {
                reference_id: layout.reference_id,
                alignment_start: layout.start,
                alignment_span: layout.span,
                record_count: layout.records,
                ..Default::default()
            },
        );
        offsets.push(offset);
        sizes.push(bytes.len() as u64 - offset);
    }
    write_container(&mut bytes, version, ContainerHeader::eof());

    CramFixture {
        bytes,
        data_offset,
        offsets,
        sizes,
        layouts: layouts.to_vec(),
    }
}

/// One container with a single compression-header block
pub fn write_container(buf: &mut Vec<u8>, version: Version, header: ContainerHeader) {
    let mut body = Vec::new();
    Block::raw(ContentType::CompressionHeader, 0, vec![0u8; 8])
        .write_to(&mut body, version)
        .unwrap();
    let header = ContainerHeader {
        length: body.len() as i32,
        block_count: 1,
        landmarks: vec![0],
        ..header
    };
    header.write_to(buf, version).unwrap();
    buf.extend_from_slice(&body);
}

impl CramFixture {
    /// BAI with one chunk per container, (offset, 0) to (offset, 1)
    pub fn bai(&self) -> bai::Index {
        let mut indexer = Indexer::<LinearIndex>::default();
        for (layout, &offset) in self.layouts.iter().zip(&self.offsets) {
            let chunk = Chunk::new(
                VirtualPosition::from(VirtualOffset::new(offset, 0).raw()),
                VirtualPosition::from(VirtualOffset::new(offset, 1).raw()),
            );
            let context = (layout.reference_id >= 0).then(|| {
                let start = layout.start.max(1) as usize;
                let end = start + layout.span.max(1) as usize - 1;
                (
                    layout.reference_id as usize,
                    Position::new(start).unwrap(),
                    Position::new(end).unwrap(),
                    true,
                )
            });
            indexer.add_record(context, chunk).unwrap();
        }
        indexer.build(sam_header().reference_sequences().len())
    }

    pub fn bai_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        bai::io::Writer::new(&mut buf).write_index(&self.bai()).unwrap();
        buf
    }

    pub fn crai_records(&self) -> Vec<crai::Record> {
        self.layouts
            .iter()
            .zip(self.offsets.iter().zip(&self.sizes))
            .map(|(layout, (&offset, &size))| {
                let reference_id = (layout.reference_id >= 0).then_some(layout.reference_id as usize);
                crai::Record::new(
                    reference_id,
                    Position::new(layout.start.max(0) as usize),
                    layout.span.max(0) as usize,
                    offset,
                    0,
                    size,
                )
            })
            .collect()
    }

    /// Gzip-compressed CRAI text
    pub fn crai_bytes(&self) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        for (layout, (offset, size)) in self.layouts.iter().zip(self.offsets.iter().zip(&self.sizes)) {
            writeln!(
                encoder,
                "{}\t{}\t{}\t{}\t0\t{}",
                layout.reference_id, layout.start, layout.span, offset, size
            )
            .unwrap();
        }
        encoder.finish().unwrap()
    }

    /// Offset of the container whose layout index is `i`
    pub fn offset(&self, i: usize) -> u64 {
        self.offsets[i]
    }
}

/// A fixture written to a temporary directory
pub struct FixtureFiles {
    pub dir: TempDir,
    pub cram: PathBuf,
}

impl FixtureFiles {
    pub fn new(fixture: &CramFixture) -> Self {
        let dir = TempDir::new().unwrap();
        let cram = dir.path().join("sample.cram");
        std::fs::write(&cram, &fixture.bytes).unwrap();
        Self { dir, cram }
    }

    pub fn write(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(bytes).unwrap();
        path
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Three chr1 containers, one chr2 container, one unmapped container
pub fn standard_layouts() -> Vec<ContainerLayout> {
    vec![
        ContainerLayout::mapped(0, 1, 10_000),
        ContainerLayout::mapped(0, 10_001, 10_000),
        ContainerLayout::mapped(0, 20_001, 30_000),
        ContainerLayout::mapped(1, 1, 5_000),
        ContainerLayout::unmapped(),
    ]
}
