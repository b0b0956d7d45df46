use sandbox_reader::{
    BytecodeError, BytecodeReader, DecodeOptions, FormatRevision, OperationKind, OperationNames,
    SINGLE_PROFILE_NAME, TableOffset,
};

/// A collection member: (name, syscall mask, policy index, operations).
type ProfileSpec = (&'static str, u16, u16, Vec<u16>);

/// Assembles synthetic containers in the on-disk layout.
#[derive(Debug, Clone)]
struct ContainerBuilder {
    revision: FormatRevision,
    flags: u16,
    table_operation_count: u8,
    regexes: Vec<Vec<u8>>,
    variables: Vec<Vec<u8>>,
    variable_states: Vec<Vec<u8>>,
    entitlements: Vec<Vec<u8>>,
    instructions: Vec<u16>,
    single_operations: Vec<u16>,
    profiles: Vec<ProfileSpec>,
    entries: Vec<[u8; 8]>,
    opaque_blocks: Vec<u8>,
}

impl ContainerBuilder {
    fn single(operations: Vec<u16>) -> Self {
        Self {
            revision: FormatRevision::Entitlements,
            flags: 0x0000,
            table_operation_count: operations.len() as u8,
            regexes: Vec::new(),
            variables: Vec::new(),
            variable_states: Vec::new(),
            entitlements: Vec::new(),
            instructions: Vec::new(),
            single_operations: operations,
            profiles: Vec::new(),
            entries: Vec::new(),
            opaque_blocks: Vec::new(),
        }
    }

    fn collection(table_operation_count: u8, profiles: Vec<ProfileSpec>) -> Self {
        Self {
            flags: 0x8000,
            table_operation_count,
            profiles,
            ..Self::single(Vec::new())
        }
    }

    fn revision(mut self, revision: FormatRevision) -> Self {
        self.revision = revision;
        self
    }

    fn entry(mut self, entry: [u8; 8]) -> Self {
        self.entries.push(entry);
        self
    }

    fn build(&self) -> Vec<u8> {
        // Sized regions, each starting on an 8-byte boundary. The last one
        // is left unpadded so any truncation cuts into it.
        let mut region = Vec::new();
        let mut place = |contents: &[u8]| -> u16 {
            while region.len() % 8 != 0 {
                region.push(0);
            }
            let offset = (region.len() / 8) as u16;
            region.extend_from_slice(&(contents.len() as u16).to_le_bytes());
            region.extend_from_slice(contents);
            offset
        };
        let regex_offsets: Vec<u16> = self.regexes.iter().map(|r| place(r.as_slice())).collect();
        let variable_offsets: Vec<u16> = self.variables.iter().map(|v| place(v.as_slice())).collect();
        let state_offsets: Vec<u16> = self.variable_states.iter().map(|s| place(s.as_slice())).collect();
        let entitlement_offsets: Vec<u16> = self.entitlements.iter().map(|e| place(e.as_slice())).collect();
        let name_offsets: Vec<u16> = self.profiles.iter().map(|p| place(p.0.as_bytes())).collect();

        let mut out = Vec::new();
        out.extend_from_slice(&self.flags.to_le_bytes());
        out.push(self.entries.len() as u8);
        out.push(self.opaque_blocks.len() as u8);
        out.push(self.table_operation_count);
        out.push(self.variables.len() as u8);
        out.push(self.variable_states.len() as u8);
        out.push(0);
        out.extend_from_slice(&(self.profiles.len() as u16).to_le_bytes());
        out.extend_from_slice(&(self.regexes.len() as u16).to_le_bytes());
        if self.revision == FormatRevision::Entitlements {
            out.extend_from_slice(&(self.entitlements.len() as u16).to_le_bytes());
        }
        out.extend_from_slice(&(self.instructions.len() as u16).to_le_bytes());

        let tables = [
            &regex_offsets,
            &variable_offsets,
            &state_offsets,
            &entitlement_offsets,
            &self.instructions,
        ];
        for table in tables {
            for offset in table.iter() {
                out.extend_from_slice(&offset.to_le_bytes());
            }
        }

        if self.flags == 0x0000 {
            for op in &self.single_operations {
                out.extend_from_slice(&op.to_le_bytes());
            }
        } else {
            for ((_, mask, index, operations), name) in self.profiles.iter().zip(&name_offsets) {
                out.extend_from_slice(&name.to_le_bytes());
                out.extend_from_slice(&mask.to_le_bytes());
                out.extend_from_slice(&index.to_le_bytes());
                for op in operations {
                    out.extend_from_slice(&op.to_le_bytes());
                }
            }
        }

        while out.len() % 8 != 0 {
            out.push(0);
        }
        for entry in &self.entries {
            out.extend_from_slice(entry);
        }
        for &fill in &self.opaque_blocks {
            out.extend(std::iter::repeat_n(fill, 0x800));
        }
        out.extend_from_slice(&region);
        out
    }
}

fn names(list: &[&str]) -> OperationNames {
    list.iter().copied().collect()
}

fn sample_collection() -> ContainerBuilder {
    let mut builder = ContainerBuilder::collection(
        3,
        vec![
            ("application", 0x0001, 7, vec![0, 1, 1]),
            ("daemon", 0x0000, 3, vec![1, 0, 0]),
        ],
    )
    .entry([0x00, 0x81, 0x02, 0x00, 0x01, 0x00, 0x00, 0x00])
    .entry([0x01, 0x00, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00]);
    builder.regexes = vec![vec![0x02, 0x00, 0x0F, 0x2A]];
    builder.variables = vec![b"PROCESS_TEMP_DIR".to_vec(), b"ANY_USER_HOME".to_vec()];
    builder.variable_states = vec![vec![0xDE, 0xAD]];
    builder.entitlements = vec![b"com.apple.security.app-sandbox".to_vec()];
    builder.instructions = vec![0, 2];
    builder.opaque_blocks = vec![0x5A];
    builder
}

#[test]
fn single_profile_decodes_end_to_end() {
    let bytes = ContainerBuilder::single(vec![0x0001, 0x0002])
        .entry([0x01, 0x00, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00])
        .build();
    let reader = BytecodeReader::from_bytes(bytes).expect("decode");

    let header = reader.header();
    assert!(header.is_single_profile());
    assert!(!header.is_collection());
    assert_eq!(header.table_operation_count, 2);
    assert_eq!(header.entitlement_key_count, Some(0));

    let raw = reader.raw();
    assert_eq!(raw.profiles.len(), 1);
    assert_eq!(raw.profiles[0].offset, 0x10);
    // Header (16) + two operations (4) ends at 20, padded to 24.
    assert_eq!(raw.padding, 4);
    assert_eq!(raw.operation_entries[0].offset, 24);
    assert_eq!(reader.table_base(), 32);

    let bytecode = reader.resolve(&names(&["default", "file-read*"])).expect("resolve");
    assert_eq!(bytecode.profiles.len(), 1);
    let profile = &bytecode.profiles[0];
    assert_eq!(profile.index, 0);
    assert_eq!(profile.name, SINGLE_PROFILE_NAME);
    assert_eq!(profile.syscall_mask, 0x0000);
    let entries: Vec<u16> = profile.operations.iter().map(|op| op.operation_entry).collect();
    assert_eq!(entries, vec![1, 2]);
    assert_eq!(profile.operations[1].name, "file-read*");

    assert_eq!(bytecode.operation_entries.len(), 1);
    let entry = bytecode.operation_entries[0].value;
    assert_eq!(entry.opcode, 1);
    assert_eq!(entry.kind(), OperationKind::Terminate);
    assert_eq!(entry.operation_num, 5);
}

#[test]
fn collection_resolves_names_and_tables() {
    let bytes = sample_collection().build();
    let reader = BytecodeReader::from_bytes(bytes).expect("decode");
    assert!(reader.header().is_collection());

    let bytecode = reader
        .resolve(&names(&["default", "file*", "file-read*"]))
        .expect("resolve");

    let profile_names: Vec<&str> = bytecode.profiles.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(profile_names, vec!["application", "daemon"]);
    // The stored policy index is authoritative, not the record position.
    assert_eq!(bytecode.profiles[0].index, 7);
    assert_eq!(bytecode.profiles[1].index, 3);
    assert_eq!(bytecode.profiles[0].syscall_mask, 0x0001);
    assert_eq!(bytecode.profiles[1].operations[0].operation_entry, 1);
    assert_eq!(bytecode.profiles[1].operations[0].name, "default");

    let variables: Vec<&str> = bytecode.variables.iter().map(|v| v.value.as_str()).collect();
    assert_eq!(variables, vec!["PROCESS_TEMP_DIR", "ANY_USER_HOME"]);
    assert_eq!(bytecode.variables[1].index, 1);
    assert_eq!(bytecode.entitlements[0].value, "com.apple.security.app-sandbox");
    assert_eq!(bytecode.regexes[0].value, vec![0x02, 0x00, 0x0F, 0x2A]);
    assert_eq!(bytecode.regexes[0].offset, 0);
    assert_eq!(bytecode.variable_states[0].value, vec![0xDE, 0xAD]);

    assert_eq!(bytecode.instructions.len(), 2);
    assert_eq!(bytecode.instructions[1].offset.position(), 16);

    assert_eq!(bytecode.operation_entries[0].value.kind(), OperationKind::Continue);
    assert_eq!(bytecode.operation_entries[0].value.filter_id(), 1);
    assert!(bytecode.operation_entries[0].value.filter_flag());
    assert_eq!(bytecode.operation_entries[0].value.unknown_two, 1);

    assert_eq!(bytecode.opaque_blocks.len(), 1);
    assert_eq!(bytecode.opaque_blocks[0].value.len(), 0x800);
    assert!(bytecode.opaque_blocks[0].value.iter().all(|&b| b == 0x5A));
}

#[test]
fn table_offsets_are_relative_to_table_base() {
    let reader = BytecodeReader::from_bytes(sample_collection().build()).expect("decode");
    let base = reader.table_base();
    let offset = reader.raw().variables[0];
    let at = base + offset.position();
    assert_eq!(&reader.bytes()[at + 2..at + 2 + 16], b"PROCESS_TEMP_DIR");
    assert_eq!(reader.read_sized(offset).expect("sized"), b"PROCESS_TEMP_DIR");
    assert_eq!(reader.read_at(TableOffset::new(0), 2).expect("raw"), vec![0x04, 0x00]);
}

#[test]
fn legacy_revision_has_no_entitlement_table() {
    let mut builder = sample_collection().revision(FormatRevision::Legacy);
    builder.entitlements.clear();
    let options = DecodeOptions::default().with_revision(FormatRevision::Legacy);
    let reader = BytecodeReader::from_bytes_with(builder.build(), options).expect("decode");

    assert_eq!(reader.header().entitlement_key_count, None);
    assert_eq!(reader.raw().profiles[0].offset, 14 + 2 * (1 + 2 + 1 + 2));
    let bytecode = reader.resolve(&names(&["a", "b", "c"])).expect("resolve");
    assert!(bytecode.entitlements.is_empty());
    assert_eq!(bytecode.variables[0].value, "PROCESS_TEMP_DIR");
    assert_eq!(bytecode.profiles[1].name, "daemon");
}

#[test]
fn padding_depends_on_profile_end_position() {
    // Profile region ends at 16 + 2n.
    for (count, padding) in [(0usize, 0usize), (1, 6), (3, 2), (4, 0), (5, 6)] {
        let bytes = ContainerBuilder::single(vec![0; count])
            .entry([0x01, 0, 0, 0, 0, 0, 0, 0])
            .build();
        let reader = BytecodeReader::from_bytes(bytes).expect("decode");
        assert_eq!(reader.raw().padding, padding, "{} operations", count);
        assert_eq!(reader.raw().operation_entries[0].offset % 8, 0);
    }
}

#[test]
fn flags_must_be_known() {
    for flags in [0x0001u16, 0xFFFF] {
        let mut builder = ContainerBuilder::single(vec![0]);
        builder.flags = flags;
        let result = BytecodeReader::from_bytes(builder.build());
        assert!(
            matches!(result, Err(BytecodeError::UnknownBytecodeFlag(f)) if f == flags),
            "flags {:#06x}",
            flags
        );
    }
}

#[test]
fn short_buffer_is_too_small() {
    assert!(matches!(
        BytecodeReader::from_bytes(vec![0u8; 10]),
        Err(BytecodeError::TooSmall { expected: 16, found: 10 })
    ));
    let legacy = DecodeOptions::default().with_revision(FormatRevision::Legacy);
    assert!(matches!(
        BytecodeReader::from_bytes_with(vec![0u8; 13], legacy),
        Err(BytecodeError::TooSmall { expected: 14, found: 13 })
    ));
}

#[test]
fn every_truncation_fails_with_bounds_error() {
    let full = sample_collection().build();
    let table = names(&["default", "file*", "file-read*"]);
    let header_len = FormatRevision::Entitlements.header_len();

    for len in 0..full.len() {
        let truncated = full[..len].to_vec();
        let result = BytecodeReader::from_bytes(truncated).and_then(|reader| reader.resolve(&table));
        match result {
            Err(BytecodeError::TooSmall { .. }) => assert!(len < header_len, "length {}", len),
            Err(BytecodeError::OffsetTooLarge { offset, length, available }) => {
                assert_eq!(available, len);
                assert!(offset + length > len, "length {}", len);
            }
            other => panic!("length {} decoded unexpectedly: {:?}", len, other),
        }
    }
    assert!(BytecodeReader::from_bytes(full).and_then(|r| r.resolve(&table)).is_ok());
}

#[test]
fn name_table_length_must_match() {
    let bytes = ContainerBuilder::single(vec![1, 2])
        .entry([0x01, 0, 5, 0, 0, 0, 0, 0])
        .build();
    let reader = BytecodeReader::from_bytes(bytes).expect("decode");

    for table in [names(&["a", "b", "c"]), names(&["a"])] {
        let found = table.len();
        assert!(matches!(
            reader.resolve(&table),
            Err(BytecodeError::InvalidOperationCount { expected: 2, found: f }) if f == found
        ));
    }
}

#[test]
fn invalid_utf8_string_is_rejected() {
    let mut builder = ContainerBuilder::single(vec![0]);
    builder.variables = vec![vec![b'o', b'k', 0xFF]];
    let reader = BytecodeReader::from_bytes(builder.build()).expect("decode");
    assert!(matches!(
        reader.resolve(&names(&["default"])),
        Err(BytecodeError::InvalidString { offset }) if offset == reader.table_base()
    ));
}

#[test]
fn empty_collection_has_no_profiles() {
    let bytes = ContainerBuilder::collection(2, Vec::new()).build();
    let reader = BytecodeReader::from_bytes(bytes).expect("decode");
    let bytecode = reader.resolve(&names(&["a", "b"])).expect("resolve");
    assert!(bytecode.profiles.is_empty());
}

#[test]
fn decoding_is_deterministic() {
    let bytes = sample_collection().build();
    let table = names(&["default", "file*", "file-read*"]);
    let first = BytecodeReader::from_bytes(bytes.clone()).expect("decode");
    let second = BytecodeReader::from_bytes(bytes).expect("decode");
    assert_eq!(first.raw(), second.raw());
    assert_eq!(first.resolve(&table).expect("resolve"), second.resolve(&table).expect("resolve"));
}

#[test]
fn sections_list_counts_in_order() {
    let reader = BytecodeReader::from_bytes(sample_collection().build()).expect("decode");
    let sections: Vec<(&str, usize)> = reader.sections().iter().map(|s| (s.label, s.count)).collect();
    assert_eq!(
        sections,
        vec![
            ("Regex", 1),
            ("Variables", 2),
            ("Variable States", 1),
            ("Entitlements", 1),
            ("Instructions", 2),
            ("Profiles", 2),
            ("Operation Entries", 2),
            ("Opaque Blocks", 1),
        ]
    );
}

#[test]
fn operation_names_parse_from_text() {
    let table = OperationNames::parse("# macOS\ndefault\n\n  file*  \nfile-read*\n");
    assert_eq!(table.len(), 3);
    assert_eq!(table.get(1), Some("file*"));
    assert_eq!(table.get(3), None);
}

#[test]
fn from_path_reads_container_file() {
    let path = std::env::temp_dir().join(format!("sandbox-reader-{}.sb.bin", std::process::id()));
    std::fs::write(&path, sample_collection().build()).expect("write fixture");
    let reader = BytecodeReader::from_path(&path).expect("decode from path");
    std::fs::remove_file(&path).ok();
    assert_eq!(reader.raw().profiles.len(), 2);

    assert!(matches!(
        BytecodeReader::from_path(path.with_extension("missing")),
        Err(BytecodeError::Io(_))
    ));
}

#[test]
fn resolved_container_serializes() {
    let reader = BytecodeReader::from_bytes(sample_collection().build()).expect("decode");
    let bytecode = reader.resolve(&names(&["default", "file*", "file-read*"])).expect("resolve");
    let yaml = serde_yaml::to_string(&bytecode).expect("yaml");
    assert!(yaml.contains("PROCESS_TEMP_DIR"));
    assert!(yaml.contains("file-read*"));

    // Instruction offsets are written as byte positions, like every other item.
    let value: serde_yaml::Value = serde_yaml::from_str(&yaml).expect("parse yaml");
    assert_eq!(value["instructions"][1]["offset"].as_u64(), Some(16));
    assert_eq!(
        value["variables"][1]["offset"].as_u64(),
        Some(bytecode.variables[1].offset as u64)
    );
}

#[test]
fn operation_entry_listing_shows_stored_filter_byte() {
    let reader = BytecodeReader::from_bytes(sample_collection().build()).expect("decode");
    let entries = &reader.raw().operation_entries;
    assert_eq!(
        entries[0].to_string(),
        "Continue, filter 1 (0x81), operation 2, unknown 1 0"
    );
    assert_eq!(
        entries[1].to_string(),
        "Terminate, filter 0 (0x00), operation 5, unknown 0 0"
    );
}

#[test]
fn variable_states_read_as_sized_blobs() {
    let reader = BytecodeReader::from_bytes(sample_collection().build()).expect("decode");
    let offset = reader.raw().variable_states[0];
    let blob = reader.read_sized(offset).expect("variable state");
    assert_eq!(blob, vec![0xDE, 0xAD]);
    assert_eq!(sandbox_reader::hexdump(&blob, 0), "00000000  de ad");
}

#[test]
fn cli_lists_sections_and_raw_filter_bytes() {
    let stem = format!("sandbox-reader-cli-{}", std::process::id());
    let input = std::env::temp_dir().join(format!("{}.sb.bin", stem));
    let operations = std::env::temp_dir().join(format!("{}.ops.txt", stem));
    std::fs::write(&input, sample_collection().build()).expect("write fixture");
    std::fs::write(&operations, "default\nfile*\nfile-read*\n").expect("write names");

    let output = std::process::Command::new(env!("CARGO_BIN_EXE_sandbox-reader"))
        .arg(&input)
        .arg("--operations")
        .arg(&operations)
        .arg("--hexdump")
        .output()
        .expect("run binary");
    std::fs::remove_file(&input).ok();
    std::fs::remove_file(&operations).ok();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8(output.stdout).expect("utf-8 output");
    assert!(stdout.contains("Continue, filter 1 (0x81), operation 2"), "{}", stdout);
    assert!(stdout.contains("\nVariables:\n"), "{}", stdout);
    assert!(stdout.contains("PROCESS_TEMP_DIR"), "{}", stdout);
    assert!(stdout.contains("\nEntitlements:\n"), "{}", stdout);
    assert!(stdout.contains("Variable state 0 at +"), "{}", stdout);
    assert!(stdout.contains("00000000  de ad"), "{}", stdout);
}
