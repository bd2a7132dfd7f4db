//! Row reader: drives the tokenizer, resolves columns, dispatches
//! converters, and writes typed cells into a growing output buffer.
//!
//! Determines `actual_num_fields` from `usecols`, a structured schema, or
//! the first data row; normalizes negative `usecols`/converter-key indices;
//! dispatches per-column typecode parsing; and grows the output buffer
//! geometrically (delegated to [`output::OutputBuffer`]).

pub mod converter;
pub mod output;

use crate::config::{ParserConfig, ReadOptions};
use crate::error::{ConverterError, ElementDescr, ReaderError};
use crate::parse::{complex, float, int, string};
use crate::schema::{ByteOrder, ElementDesc, ElementKind, GenericValue, Layout, Schema};
use crate::stream::ChunkSource;
use crate::tokenizer::TokenizerState;

pub use converter::Converter;
use output::OutputBuffer;

/// One resolved output column: which [`ElementDesc`] to parse with and
/// where its cell lives within a row's byte arena.
struct FieldType {
    element: ElementDesc,
    byte_offset: usize,
}

/// The result of a successful [`read`] call.
///
/// `bytes` holds every fixed-width cell packed row-major; `generics` holds
/// one inner `Vec` per output column whose element kind is
/// [`ElementKind::Generic`] (these carry no fixed byte width and so live
/// outside the byte arena, appended one value per row in lockstep with
/// `bytes`).
pub struct Table {
    pub bytes: Vec<u8>,
    pub rows: usize,
    pub row_size: usize,
    pub num_cols: usize,
    pub schema: Schema,
    pub generics: Vec<Vec<GenericValue>>,
}

impl Table {
    /// Byte slice of row `i`'s arena (empty if every column is `Generic`).
    pub fn row(&self, i: usize) -> &[u8] {
        &self.bytes[i * self.row_size..(i + 1) * self.row_size]
    }
}

/// Reads a whole delimited-text stream into a [`Table`] per the resolved
/// dialect, options, and schema.
pub fn read<S: ChunkSource>(
    mut stream: S,
    config: &ParserConfig,
    options: &ReadOptions,
    schema: &Schema,
) -> Result<Table, ReaderError> {
    log::debug!(
        "read start: structured={} usecols={:?} skiprows={} max_rows={:?}",
        schema.is_structured(),
        options.usecols,
        options.skiprows,
        options.max_rows
    );

    let mut tok = TokenizerState::new();
    for _ in 0..options.skiprows {
        if !tok.skip_line(&mut stream)? {
            break;
        }
    }

    // actual_num_fields is fixed up front whenever usecols or a structured
    // schema already determines the output width; otherwise it is learned
    // from the first data row.
    let mut actual_num_fields = fixed_num_output_cols(options, schema);

    let mut field_types: Option<Vec<FieldType>> = actual_num_fields.map(|n| build_field_types(schema, n));
    let mut converter_keys: Option<Vec<Option<i64>>> =
        match actual_num_fields {
            Some(n) => Some(resolve_converter_keys(options, n)?),
            None => None,
        };

    let mut output: Option<OutputBuffer> = None;
    let mut generics: Vec<Vec<GenericValue>> = Vec::new();
    let mut row_index = 0usize;

    loop {
        if let Some(max_rows) = options.max_rows {
            if row_index >= max_rows {
                break;
            }
        }
        if !tok.next_row(&mut stream, config)? {
            break;
        }
        let current_num_fields = tok.num_fields();

        if actual_num_fields.is_none() {
            actual_num_fields = Some(current_num_fields);
            let n = current_num_fields;
            field_types = Some(build_field_types(schema, n));
            converter_keys = Some(resolve_converter_keys(options, n)?);
            log::debug!("actual_num_fields resolved from first row: {n}");
        } else if options.usecols.is_none() && current_num_fields != actual_num_fields.unwrap() {
            return Err(ReaderError::ChangedNumberOfFields {
                row: row_index,
                expected: actual_num_fields.unwrap(),
                got: current_num_fields,
            });
        }

        let field_types = field_types.as_ref().expect("resolved above");
        let converter_keys = converter_keys.as_ref().expect("resolved above");
        let num_output_cols = field_types.len();

        if output.is_none() {
            let row_size = schema.row_size(num_output_cols);
            output = Some(OutputBuffer::new(row_size, options.max_rows)?);
            generics = vec![Vec::new(); num_output_cols];
            log::debug!("output buffer allocated: row_size={row_size} cols={num_output_cols}");
        }
        let output = output.as_mut().expect("allocated above");
        let mut row_bytes = output.reserve_row()?;

        for i in 0..num_output_cols {
            let source_col = resolve_source_col(options, i, current_num_fields, row_index)?;
            if source_col >= current_num_fields as i64 || source_col < 0 {
                return Err(ReaderError::InvalidColumnIndex {
                    row: row_index,
                    requested: source_col,
                    current_width: current_num_fields,
                });
            }
            let text = tok.field(source_col as usize);
            let ft = &field_types[i];

            let bound = converter_keys[i].map(|key| &options.converters[&key]);

            if ft.element.kind == ElementKind::Generic {
                let value = match bound {
                    Some(conv) => conv.invoke(text).map_err(|cause| wrap_converter_error(cause, row_index, i))?,
                    None => identity_generic(config, text),
                };
                generics[i].push(value);
                continue;
            }

            let cell = &mut row_bytes[ft.byte_offset..ft.byte_offset + ft.element.size];
            match bound {
                Some(conv) => {
                    let value = conv.invoke(text).map_err(|cause| wrap_converter_error(cause, row_index, i))?;
                    coerce_generic_into_cell(&value, &ft.element, cell, config, row_index, i)?;
                }
                None => {
                    set_from_text(&ft.element, text, cell, config, row_index, i)?;
                }
            }
        }

        log::trace!("row {row_index} complete: {current_num_fields} fields");
        row_index += 1;
    }

    let num_output_cols = field_types.as_ref().map(|f| f.len()).unwrap_or(0);
    let row_size = schema.row_size(num_output_cols);
    let bytes = match output {
        Some(buf) => buf.finish(),
        None => Vec::new(),
    };

    Ok(Table {
        rows: row_index,
        row_size,
        num_cols: num_output_cols,
        schema: schema.clone(),
        bytes,
        generics,
    })
}

/// Output column count already implied by `usecols` or a structured schema,
/// before any row has been read. `None` means it must be learned from the
/// first row.
fn fixed_num_output_cols(options: &ReadOptions, schema: &Schema) -> Option<usize> {
    if let Some(usecols) = &options.usecols {
        Some(usecols.len())
    } else if schema.is_structured() {
        Some(schema.field_count())
    } else {
        None
    }
}

fn build_field_types(schema: &Schema, num_output_cols: usize) -> Vec<FieldType> {
    match &schema.layout {
        Layout::Homogeneous => {
            let element = schema.elements[0].clone();
            let size = element.size;
            (0..num_output_cols)
                .map(|i| FieldType { element: element.clone(), byte_offset: i * size })
                .collect()
        }
        Layout::Structured { offsets } => schema
            .elements
            .iter()
            .zip(offsets.iter())
            .map(|(element, &off)| FieldType { element: element.clone(), byte_offset: off })
            .collect(),
    }
}

/// Resolves output column `i`'s source column index, applying the
/// negative-index normalization against the *current* row's field count
/// (not the fixed `actual_num_fields`).
fn resolve_source_col(
    options: &ReadOptions,
    i: usize,
    current_num_fields: usize,
    row: usize,
) -> Result<i64, ReaderError> {
    let raw = match &options.usecols {
        Some(usecols) => usecols[i],
        None => i as i64,
    };
    let normalized = if raw < 0 { raw + current_num_fields as i64 } else { raw };
    if normalized < 0 {
        return Err(ReaderError::InvalidColumnIndex {
            row,
            requested: raw,
            current_width: current_num_fields,
        });
    }
    Ok(normalized)
}

/// Builds the output-column → converters-map-key table. With `usecols`
/// present, a converter key
/// survives only if it equals some `usecols[i]` literally (no negative-index
/// normalization in this branch); entries that don't match are dropped.
/// Without `usecols`, negative keys are normalized against `num_output_cols`
/// and a key outside `[-n, n)` is a fatal error.
fn resolve_converter_keys(options: &ReadOptions, num_output_cols: usize) -> Result<Vec<Option<i64>>, ReaderError> {
    let mut keys: Vec<Option<i64>> = vec![None; num_output_cols];
    if let Some(usecols) = &options.usecols {
        for key in options.converters.keys() {
            if let Some(i) = usecols.iter().position(|c| c == key) {
                keys[i] = Some(*key);
            }
        }
    } else {
        let n = num_output_cols as i64;
        for &key in options.converters.keys() {
            let normalized = if key < 0 { key + n } else { key };
            if normalized < 0 || normalized >= n {
                return Err(ReaderError::InvalidColumnIndex { row: 0, requested: key, current_width: num_output_cols });
            }
            keys[normalized as usize] = Some(key);
        }
    }
    Ok(keys)
}

fn wrap_converter_error(cause: ConverterError, row: usize, col: usize) -> ReaderError {
    ReaderError::ConverterFailed { row, col, cause }
}

fn identity_generic(config: &ParserConfig, text: &[u32]) -> GenericValue {
    if config.python_byte_converters || config.c_byte_converters {
        let bytes = text.iter().map(|&cp| (cp & 0xff) as u8).collect();
        GenericValue::Bytes(bytes)
    } else {
        GenericValue::Text(text.iter().filter_map(|&c| char::from_u32(c)).collect())
    }
}

/// Re-routes a converter's returned value through the normal text-based
/// dispatch by turning it back into code points, except for the two string
/// kinds, where an overlong result is reported as `OverlongString` (not
/// `BadField`) because it came from a converter rather than the literal
/// field text.
fn coerce_generic_into_cell(
    value: &GenericValue,
    element: &ElementDesc,
    dst: &mut [u8],
    config: &ParserConfig,
    row: usize,
    col: usize,
) -> Result<(), ReaderError> {
    match element.kind {
        ElementKind::NarrowString => {
            let bytes = generic_to_bytes(value);
            if bytes.len() > element.size {
                return Err(ReaderError::OverlongString { row, col });
            }
            dst[..bytes.len()].copy_from_slice(&bytes);
            for b in &mut dst[bytes.len()..] {
                *b = 0;
            }
            Ok(())
        }
        ElementKind::WideString => {
            let codepoints = generic_to_codepoints(value);
            if codepoints.len() > element.size / 4 {
                return Err(ReaderError::OverlongString { row, col });
            }
            string::write_wide(&codepoints, dst, element.size, element.byte_order, row, col)
        }
        _ => {
            let codepoints = generic_to_codepoints(value);
            set_from_text(element, &codepoints, dst, config, row, col)
        }
    }
}

fn generic_to_bytes(value: &GenericValue) -> Vec<u8> {
    match value {
        GenericValue::Bytes(b) => b.clone(),
        GenericValue::Text(s) => s.bytes().collect(),
    }
}

fn generic_to_codepoints(value: &GenericValue) -> Vec<u32> {
    match value {
        GenericValue::Bytes(b) => b.iter().map(|&b| b as u32).collect(),
        GenericValue::Text(s) => s.chars().map(|c| c as u32).collect(),
    }
}

/// Dispatches a single field's text to the parser its [`ElementKind`]
/// implies, writing the result into `dst` (exactly `element.size` bytes).
fn set_from_text(
    element: &ElementDesc,
    text: &[u32],
    dst: &mut [u8],
    config: &ParserConfig,
    row: usize,
    col: usize,
) -> Result<(), ReaderError> {
    match element.kind {
        ElementKind::Int8 => write_signed(text, dst, i8::MIN as i64, i8::MAX as i64, config, element.byte_order, row, col, ElementDescr::Int8),
        ElementKind::Int16 => write_signed(text, dst, i16::MIN as i64, i16::MAX as i64, config, element.byte_order, row, col, ElementDescr::Int16),
        ElementKind::Int32 => write_signed(text, dst, i32::MIN as i64, i32::MAX as i64, config, element.byte_order, row, col, ElementDescr::Int32),
        ElementKind::Int64 => write_signed(text, dst, i64::MIN, i64::MAX, config, element.byte_order, row, col, ElementDescr::Int64),
        ElementKind::UInt8 => write_unsigned(text, dst, u8::MAX as u64, config, element.byte_order, row, col, ElementDescr::UInt8),
        ElementKind::UInt16 => write_unsigned(text, dst, u16::MAX as u64, config, element.byte_order, row, col, ElementDescr::UInt16),
        ElementKind::UInt32 => write_unsigned(text, dst, u32::MAX as u64, config, element.byte_order, row, col, ElementDescr::UInt32),
        ElementKind::UInt64 => write_unsigned(text, dst, u64::MAX, config, element.byte_order, row, col, ElementDescr::UInt64),
        ElementKind::Float32 => {
            let v = float::parse_float(text).ok_or_else(|| bad_field(row, col, ElementDescr::Float32, text))?;
            put_bytes(dst, (v as f32).to_ne_bytes(), (v as f32).to_be_bytes(), element.byte_order);
            Ok(())
        }
        ElementKind::Float64 => {
            let v = float::parse_float(text).ok_or_else(|| bad_field(row, col, ElementDescr::Float64, text))?;
            put_bytes(dst, v.to_ne_bytes(), v.to_be_bytes(), element.byte_order);
            Ok(())
        }
        ElementKind::Complex64 => {
            let (re, im) =
                complex::parse_complex(text, config.imaginary_unit).ok_or_else(|| bad_field(row, col, ElementDescr::Complex64, text))?;
            put_bytes(&mut dst[0..4], (re as f32).to_ne_bytes(), (re as f32).to_be_bytes(), element.byte_order);
            put_bytes(&mut dst[4..8], (im as f32).to_ne_bytes(), (im as f32).to_be_bytes(), element.byte_order);
            Ok(())
        }
        ElementKind::Complex128 => {
            let (re, im) =
                complex::parse_complex(text, config.imaginary_unit).ok_or_else(|| bad_field(row, col, ElementDescr::Complex128, text))?;
            put_bytes(&mut dst[0..8], re.to_ne_bytes(), re.to_be_bytes(), element.byte_order);
            put_bytes(&mut dst[8..16], im.to_ne_bytes(), im.to_be_bytes(), element.byte_order);
            Ok(())
        }
        ElementKind::Bool => {
            let v = int::parse_bool(text).ok_or_else(|| bad_field(row, col, ElementDescr::Bool, text))?;
            dst[0] = v as u8;
            Ok(())
        }
        ElementKind::NarrowString => string::write_narrow(text, dst, element.size, row, col),
        ElementKind::WideString => string::write_wide(text, dst, element.size, element.byte_order, row, col),
        ElementKind::Generic => unreachable!("Generic columns are routed to the side table before set_from_text is called"),
    }
}

fn write_signed(
    text: &[u32],
    dst: &mut [u8],
    min: i64,
    max: i64,
    config: &ParserConfig,
    byte_order: ByteOrder,
    row: usize,
    col: usize,
    descr: ElementDescr,
) -> Result<(), ReaderError> {
    let v = int::parse_int_with_fallback(text, min, max, config.allow_float_for_int)
        .ok_or_else(|| bad_field(row, col, descr, text))?;
    match dst.len() {
        1 => dst[0] = v as i8 as u8,
        2 => put_bytes(dst, (v as i16).to_ne_bytes(), (v as i16).to_be_bytes(), byte_order),
        4 => put_bytes(dst, (v as i32).to_ne_bytes(), (v as i32).to_be_bytes(), byte_order),
        8 => put_bytes(dst, v.to_ne_bytes(), v.to_be_bytes(), byte_order),
        n => unreachable!("unexpected signed integer cell width {n}"),
    }
    Ok(())
}

fn write_unsigned(
    text: &[u32],
    dst: &mut [u8],
    max: u64,
    config: &ParserConfig,
    byte_order: ByteOrder,
    row: usize,
    col: usize,
    descr: ElementDescr,
) -> Result<(), ReaderError> {
    let v = int::parse_uint_with_fallback(text, max, config.allow_float_for_int)
        .ok_or_else(|| bad_field(row, col, descr, text))?;
    match dst.len() {
        1 => dst[0] = v as u8,
        2 => put_bytes(dst, (v as u16).to_ne_bytes(), (v as u16).to_be_bytes(), byte_order),
        4 => put_bytes(dst, (v as u32).to_ne_bytes(), (v as u32).to_be_bytes(), byte_order),
        8 => put_bytes(dst, v.to_ne_bytes(), v.to_be_bytes(), byte_order),
        n => unreachable!("unexpected unsigned integer cell width {n}"),
    }
    Ok(())
}

fn put_bytes<const N: usize>(dst: &mut [u8], ne: [u8; N], be: [u8; N], byte_order: ByteOrder) {
    if byte_order.is_native() {
        dst.copy_from_slice(&ne);
    } else {
        dst.copy_from_slice(&be);
    }
}

fn bad_field(row: usize, col: usize, descr: ElementDescr, text: &[u32]) -> ReaderError {
    ReaderError::BadField {
        row,
        col,
        descr,
        text: text.iter().filter_map(|&c| char::from_u32(c)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReaderBuilder;
    use crate::stream::lines::LinesChunkSource;
    use std::io;

    fn lines_source(lines: &[&str]) -> LinesChunkSource<impl Iterator<Item = io::Result<String>>> {
        let owned: Vec<io::Result<String>> = lines.iter().map(|s| Ok(s.to_string())).collect();
        LinesChunkSource::new(owned.into_iter())
    }

    fn i32_at(bytes: &[u8], offset: usize) -> i32 {
        i32::from_ne_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    #[test]
    fn scenario_1_homogeneous_int32_table() {
        let (config, options) = ReaderBuilder::new().build();
        let schema = Schema::homogeneous(ElementDesc::new(ElementKind::Int32));
        let source = lines_source(&["1,2,3", "4,5,6"]);
        let table = read(source, &config, &options, &schema).unwrap();

        assert_eq!(table.rows, 2);
        assert_eq!(table.num_cols, 3);
        assert_eq!(i32_at(table.row(0), 0), 1);
        assert_eq!(i32_at(table.row(0), 8), 3);
        assert_eq!(i32_at(table.row(1), 4), 5);
    }

    #[test]
    fn scenario_3_blank_line_elided() {
        let (config, options) = ReaderBuilder::new().build();
        let schema = Schema::homogeneous(ElementDesc::new(ElementKind::Int32));
        let source = lines_source(&["1,2,3", "", "4,5,6"]);
        let table = read(source, &config, &options, &schema).unwrap();
        assert_eq!(table.rows, 2);
    }

    #[test]
    fn scenario_5_changed_field_count_is_fatal_without_usecols() {
        let (config, options) = ReaderBuilder::new().build();
        let schema = Schema::homogeneous(ElementDesc::new(ElementKind::Int32));
        let source = lines_source(&["1,2,3", "1,2"]);
        let err = read(source, &config, &options, &schema).unwrap_err();
        assert!(matches!(err, ReaderError::ChangedNumberOfFields { row: 1, expected: 3, got: 2 }));
    }

    #[test]
    fn scenario_5_usecols_masks_changed_field_count() {
        let (config, options) = ReaderBuilder::new().usecols(vec![0, 1]).build();
        let schema = Schema::homogeneous(ElementDesc::new(ElementKind::Int32));
        let source = lines_source(&["1,2,3", "1,2"]);
        let table = read(source, &config, &options, &schema).unwrap();
        assert_eq!(table.rows, 2);
        assert_eq!(i32_at(table.row(1), 0), 1);
        assert_eq!(i32_at(table.row(1), 4), 2);
    }

    #[test]
    fn scenario_6_complex128() {
        let (config, options) = ReaderBuilder::new().build();
        let schema = Schema::homogeneous(ElementDesc::new(ElementKind::Complex128));
        let source = lines_source(&["(1+2j),(3-4j)"]);
        let table = read(source, &config, &options, &schema).unwrap();
        let row = table.row(0);
        let re = f64::from_ne_bytes(row[0..8].try_into().unwrap());
        let im = f64::from_ne_bytes(row[8..16].try_into().unwrap());
        assert_eq!((re, im), (1.0, 2.0));
        let re2 = f64::from_ne_bytes(row[16..24].try_into().unwrap());
        let im2 = f64::from_ne_bytes(row[24..32].try_into().unwrap());
        assert_eq!((re2, im2), (3.0, -4.0));
    }

    #[test]
    fn skiprows_beyond_eof_yields_empty_result_not_error() {
        let (config, options) = ReaderBuilder::new().skiprows(10).build();
        let schema = Schema::homogeneous(ElementDesc::new(ElementKind::Int32));
        let source = lines_source(&["1,2,3"]);
        let table = read(source, &config, &options, &schema).unwrap();
        assert_eq!(table.rows, 0);
    }

    #[test]
    fn max_rows_caps_output() {
        let (config, options) = ReaderBuilder::new().max_rows(1).build();
        let schema = Schema::homogeneous(ElementDesc::new(ElementKind::Int32));
        let source = lines_source(&["1,2,3", "4,5,6", "7,8,9"]);
        let table = read(source, &config, &options, &schema).unwrap();
        assert_eq!(table.rows, 1);
    }

    #[test]
    fn converter_coerces_text_result_into_fixed_cell() {
        let (config, options) = ReaderBuilder::new()
            .converter(1, Converter::new(|_text| Ok(GenericValue::Text("99".to_string()))))
            .build();
        let schema = Schema::homogeneous(ElementDesc::new(ElementKind::Int32));
        let source = lines_source(&["1,2,3"]);
        let table = read(source, &config, &options, &schema).unwrap();
        assert_eq!(i32_at(table.row(0), 4), 99);
    }

    #[test]
    fn generic_column_collects_into_side_table() {
        let (config, options) = ReaderBuilder::new().build();
        let schema = Schema::structured(
            vec![ElementDesc::new(ElementKind::Int32), ElementDesc::new(ElementKind::Generic)],
            vec![0, 4],
        );
        let source = lines_source(&["1,hello"]);
        let table = read(source, &config, &options, &schema).unwrap();
        assert_eq!(table.generics[1][0], GenericValue::Text("hello".to_string()));
    }
}
