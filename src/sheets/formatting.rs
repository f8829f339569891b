use crate::error::{AppError, Result};
use google_sheets4::FieldMask;
use google_sheets4::api::{
    AddBandingRequest, AutoResizeDimensionsRequest, BandedRange, BandingProperties, CellData,
    CellFormat, Color, DeleteBandingRequest, DimensionRange, GridProperties, GridRange,
    RepeatCellRequest, Request, Sheet, SheetProperties, TextFormat, UpdateSheetPropertiesRequest,
};

pub(super) fn sheet_id(sheet: &Sheet) -> Result<i32> {
    sheet
        .properties
        .as_ref()
        .and_then(|p| p.sheet_id)
        .ok_or_else(|| AppError::Sheets("Sheet ID not found".to_string()))
}

/// Make one row bold.
pub(super) fn bold_row_rule(sheet_id: i32, row: i32) -> Request {
    Request {
        repeat_cell: Some(RepeatCellRequest {
            range: Some(GridRange {
                sheet_id: Some(sheet_id),
                start_row_index: Some(row),
                end_row_index: Some(row + 1),
                start_column_index: None,
                end_column_index: None,
            }),
            cell: Some(CellData {
                user_entered_format: Some(CellFormat {
                    text_format: Some(TextFormat {
                        bold: Some(true),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            fields: Some(FieldMask::new(&["userEnteredFormat.textFormat.bold"])),
        }),
        ..Default::default()
    }
}

/// Freeze header row.
pub(super) fn freeze_header_rule(sheet_id: i32) -> Request {
    Request {
        update_sheet_properties: Some(UpdateSheetPropertiesRequest {
            properties: Some(SheetProperties {
                sheet_id: Some(sheet_id),
                grid_properties: Some(GridProperties {
                    frozen_row_count: Some(1),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            fields: Some(FieldMask::new(&["gridProperties.frozenRowCount"])),
        }),
        ..Default::default()
    }
}

/// Fit the first `columns` columns to their content.
pub(super) fn auto_resize_rule(sheet_id: i32, columns: usize) -> Request {
    Request {
        auto_resize_dimensions: Some(AutoResizeDimensionsRequest {
            dimensions: Some(DimensionRange {
                sheet_id: Some(sheet_id),
                dimension: Some("COLUMNS".to_string()),
                start_index: Some(0),
                end_index: Some(columns as i32),
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Replace any banding on the sheet with alternating row colors over
/// `rows` x `columns` (header included). No banding is added without data rows.
pub(super) fn banding_rules(sheet_id: i32, sheet: &Sheet, rows: usize, columns: usize) -> Vec<Request> {
    let mut requests: Vec<Request> = sheet
        .banded_ranges
        .as_deref()
        .unwrap_or_default()
        .iter()
        .filter_map(|range| range.banded_range_id)
        .map(|id| Request {
            delete_banding: Some(DeleteBandingRequest {
                banded_range_id: Some(id),
            }),
            ..Default::default()
        })
        .collect();

    if rows <= 1 {
        return requests;
    }

    let header_grey = Color {
        red: Some(0.851),
        green: Some(0.851),
        blue: Some(0.851),
        alpha: Some(1.0),
    };
    let white = Color {
        red: Some(1.0),
        green: Some(1.0),
        blue: Some(1.0),
        alpha: Some(1.0),
    };
    let light_blue = Color {
        red: Some(0.910),
        green: Some(0.941),
        blue: Some(0.996),
        alpha: Some(1.0),
    };

    requests.push(Request {
        add_banding: Some(AddBandingRequest {
            banded_range: Some(BandedRange {
                range: Some(GridRange {
                    sheet_id: Some(sheet_id),
                    start_row_index: Some(0),
                    end_row_index: Some(rows as i32),
                    start_column_index: Some(0),
                    end_column_index: Some(columns as i32),
                }),
                row_properties: Some(BandingProperties {
                    header_color: Some(header_grey),
                    first_band_color: Some(white),
                    second_band_color: Some(light_blue),
                    ..Default::default()
                }),
                ..Default::default()
            }),
        }),
        ..Default::default()
    });

    requests
}
