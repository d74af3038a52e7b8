//! Meal slot bookkeeping.
//!
//! Each day of the month owns one row (`day + 1`, row 1 is the header) with
//! four slot cells. A message fills the first empty slot in order
//! morning → lunch → dinner → midnight, and stamps the day into the tracking
//! cell.

use async_trait::async_trait;
use tracing::info;

use crate::Result;

/// Location of the "last updated day" cell.
pub const TRACKING_CELL: (u32, u32) = (4, 7);

/// Daily time window, stored in its own column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Morning,
    Lunch,
    Dinner,
    Midnight,
}

impl Slot {
    /// Slots in fill order.
    pub const ALL: [Slot; 4] = [Slot::Morning, Slot::Lunch, Slot::Dinner, Slot::Midnight];

    /// 1-based worksheet column.
    pub fn column(self) -> u32 {
        match self {
            Slot::Morning => 2,
            Slot::Lunch => 3,
            Slot::Dinner => 4,
            Slot::Midnight => 5,
        }
    }
}

/// Text sent back to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Ok,
    NotInt,
    AlreadyFilled,
    InputError,
}

impl Reply {
    pub fn text(self) -> &'static str {
        match self {
            Reply::Ok => "OK",
            Reply::NotInt => "not int",
            Reply::AlreadyFilled => "入力済み",
            Reply::InputError => "入力エラー",
        }
    }
}

/// Outcome of inspecting a day's slot cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotDecision {
    Open(Slot),
    Full,
    Unreadable,
}

/// Pick the first empty slot. `cells` holds the morning..midnight values.
pub fn decide_slot(cells: &[Option<String>]) -> SlotDecision {
    let empty = |cell: &Option<String>| cell.as_deref().map_or(true, str::is_empty);
    match cells {
        [morning, ..] if empty(morning) => SlotDecision::Open(Slot::Morning),
        [_, lunch, ..] if empty(lunch) => SlotDecision::Open(Slot::Lunch),
        [_, _, dinner, ..] if empty(dinner) => SlotDecision::Open(Slot::Dinner),
        [_, _, _, midnight] if empty(midnight) => SlotDecision::Open(Slot::Midnight),
        [_, _, _, _] => SlotDecision::Full,
        _ => SlotDecision::Unreadable,
    }
}

/// Title of the worksheet holding `month` (1-12), e.g. `6月`.
pub fn worksheet_title(month: u32) -> String {
    format!("{}月", month)
}

/// Row holding the given day of month.
pub fn row_for_day(day: u32) -> u32 {
    day + 1
}

/// Worksheet backing the meal log for one month.
#[async_trait]
pub trait MealSheet: Send + Sync {
    /// Values of the four slot cells in `row`, `None` for empty cells.
    async fn read_slots(&self, row: u32) -> Result<Vec<Option<String>>>;

    /// Overwrite a single cell with `value`, parsed as if typed by a user.
    async fn write_cell(&self, row: u32, column: u32, value: &str) -> Result<()>;
}

/// Opens a month's worksheet by title.
#[async_trait]
pub trait SheetOpener: Send + Sync {
    async fn open(&self, title: &str) -> Result<Box<dyn MealSheet>>;
}

/// Normalize a chat message into an ASCII integer literal.
///
/// Accepts an optional sign, ASCII or full-width digits, and single
/// underscores between digits. Leading zeros are dropped. There is no
/// upper bound on the magnitude.
pub fn parse_integer(text: &str) -> Option<String> {
    let text = text.trim();
    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    let mut digits = String::with_capacity(unsigned.len());
    let mut after_digit = false;
    for c in unsigned.chars() {
        match c {
            '0'..='9' => digits.push(c),
            '０'..='９' => digits.push(char::from(b'0' + (u32::from(c) - u32::from('０')) as u8)),
            '_' if after_digit => {
                after_digit = false;
                continue;
            }
            _ => return None,
        }
        after_digit = true;
    }
    if !after_digit {
        return None;
    }

    let magnitude = match digits.trim_start_matches('0') {
        "" => "0",
        trimmed => trimmed,
    };
    Some(if negative && magnitude != "0" {
        format!("-{}", magnitude)
    } else {
        magnitude.to_string()
    })
}

/// Record `text` for `day` in the first empty slot.
pub async fn record_meal<S: MealSheet + ?Sized>(sheet: &S, day: u32, text: &str) -> Result<Reply> {
    let row = row_for_day(day);
    let cells = sheet.read_slots(row).await?;

    let slot = match decide_slot(&cells) {
        SlotDecision::Open(slot) => slot,
        SlotDecision::Full => return Ok(Reply::AlreadyFilled),
        SlotDecision::Unreadable => return Ok(Reply::InputError),
    };

    let Some(value) = parse_integer(text) else {
        return Ok(Reply::NotInt);
    };

    sheet.write_cell(row, slot.column(), &value).await?;
    let (tracking_row, tracking_column) = TRACKING_CELL;
    sheet
        .write_cell(tracking_row, tracking_column, &day.to_string())
        .await?;

    info!("Recorded {} for day {} in {:?} slot", value, day, slot);
    Ok(Reply::Ok)
}
