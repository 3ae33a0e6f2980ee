use archivarr_models::{DocumentPermissions, PgStore, db};
use failure::{Error, format_err};
use std::fmt;
use termion::style::{Underline, Reset};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::{Config, Result};

/// Connect to the database and storage described by configuration.
pub fn connect(cfg: &Config) -> Result<PgStore> {
    let pool = db::configure_pool(cfg.model.database.as_ref())?;
    Ok(PgStore::new(pool, cfg.model.storage.clone()))
}

/// Parse a comma-separated list of permission names.
pub fn parse_permissions(v: &str) -> Result<DocumentPermissions> {
    let mut permissions = DocumentPermissions::empty();

    for name in v.split(',').map(str::trim).filter(|name| !name.is_empty()) {
        let permission = DocumentPermissions::from_str(name)
            .ok_or_else(|| format_err!("Unknown permission: {}", name))?;
        permissions.insert(permission);
    }

    Ok(permissions)
}

/// Parse a permission list as a command line argument.
pub fn parse_permissions_arg(v: &str) -> Result<DocumentPermissions, String> {
    parse_permissions(v).map_err(|err: Error| err.to_string())
}

pub fn print_table<H, T, R>(header: H, rows: T)
where
    H: TableRow,
    T: AsRef<[R]>,
    R: TableRow<Size = H::Size>,
{
    let mut widths = vec![0; H::size()];

    for (inx, width) in widths.iter_mut().enumerate() {
        *width = UnicodeWidthStr::width(header.column(inx));
    }

    for row in rows.as_ref() {
        for (inx, width) in widths.iter_mut().enumerate() {
            *width = (*width).max(UnicodeWidthStr::width(row.column(inx)));
        }
    }

    let (terminal_width, _) = termion::terminal_size().unwrap_or((80, 20));
    fit_widths(&mut widths, usize::from(terminal_width));

    for (inx, width) in widths.iter().enumerate() {
        if inx > 0 {
            print!(" ");
        }
        print!("{}{}{}", Underline, Column(header.column(inx), *width), Reset);
    }
    println!();

    for row in rows.as_ref() {
        for (inx, width) in widths.iter().enumerate() {
            if inx > 0 {
                print!(" ");
            }
            print!("{}", Column(row.column(inx), *width));
        }
        println!();
    }
}

/// Shrink the last column so that the whole table fits in `available`
/// columns. Tables which can't fit are left as they are and will wrap.
fn fit_widths(widths: &mut [usize], available: usize) {
    // Sum of all longest widths and spaces separating them.
    let total = widths.iter().sum::<usize>() + widths.len().saturating_sub(1);

    if total < available {
        return;
    }

    if let Some(last) = widths.last_mut() {
        let overflow = total - available + 1;
        if overflow < *last {
            *last -= overflow;
        }
    }
}

pub trait TableRow {
    type Size;

    fn size() -> usize;

    fn column(&self, index: usize) -> &str;
}

macro_rules! impl_table_row {
    {
        $(
            $sizeconst:literal $size:ident => $($inx:tt : $ty:ident),+
        );+
        $(;)*
    } => {
        $(
            pub struct $size;

            impl<$($ty),+> TableRow for ($($ty,)+)
            where
                $($ty: AsRef<str>),+
            {
                type Size = $size;

                fn size() -> usize { $sizeconst }

                fn column(&self, index: usize) -> &str {
                    match index {
                        $($inx => self.$inx.as_ref(),)+
                        _ => panic!("Index {} out of range", index),
                    }
                }
            }
        )+
    };
}

impl_table_row! {
    4 Four  => 0: A, 1: B, 2: C, 3: D;
    6 Six   => 0: A, 1: B, 2: C, 3: D, 4: E, 5: F;
}

/// A table cell, truncated or padded to a width.
struct Column<'a>(&'a str, usize);

impl<'a> fmt::Display for Column<'a> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let (len, end) = self.0.char_indices()
            .scan(0, |total_len, (inx, chr)| {
                *total_len += UnicodeWidthChar::width(chr).unwrap_or(0);
                if *total_len > self.1 {
                    None
                } else {
                    Some((*total_len, inx + chr.len_utf8()))
                }
            })
            .last()
            .unwrap_or((0, 0));

        let pad = self.1.saturating_sub(len);

        write!(fmt, "{0}{1:2$}", &self.0[..end], "", pad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permissions_are_parsed_from_list() {
        assert_eq!(
            parse_permissions("document:download, version:view").unwrap(),
            DocumentPermissions::DOWNLOAD | DocumentPermissions::VIEW_VERSIONS,
        );
        assert_eq!(parse_permissions("").unwrap(), DocumentPermissions::empty());
        assert!(parse_permissions("document:download,document:eat").is_err());
    }

    #[test]
    fn columns_are_padded_and_truncated() {
        assert_eq!(Column("abc", 5).to_string(), "abc  ");
        assert_eq!(Column("abcdef", 4).to_string(), "abcd");
        assert_eq!(Column("zażółć", 4).to_string(), "zażó");
    }

    #[test]
    fn last_column_shrinks_to_fit() {
        let mut widths = [4, 10, 30];
        fit_widths(&mut widths, 40);
        assert_eq!(widths, [4, 10, 23]);

        let mut widths = [30, 30, 2];
        fit_widths(&mut widths, 40);
        assert_eq!(widths, [30, 30, 2]);
    }
}
