//! Voucher ledger business logic.
//!
//! Vouchers are single-use codes. Creation auto-generates a 12-character
//! code when none is given; redemption flips `is_used` exactly once and
//! never back. Consumption is a guarded single-row update so that two
//! concurrent redeemers cannot both succeed: the loser sees zero affected
//! rows and gets `VoucherAlreadyUsed`.

use crate::{
    entities::{Voucher, voucher},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Set, prelude::*, sea_query::Expr};
use tracing::info;
use uuid::Uuid;

/// Length of auto-generated voucher codes.
const CODE_LENGTH: usize = 12;

/// Creates a voucher.
///
/// When `code` is None (or blank) a random 12-character code is generated,
/// as when an organizer leaves the field empty. The code column is unique;
/// supplying a duplicate code surfaces as a database error.
pub async fn create_voucher(
    db: &DatabaseConnection,
    code: Option<String>,
    remarks: String,
    date_valid: DateTimeUtc,
    voucher_type_id: Option<i64>,
) -> Result<voucher::Model> {
    let code = match code {
        Some(c) if !c.trim().is_empty() => c.trim().to_string(),
        _ => generate_code(),
    };

    let model = voucher::ActiveModel {
        code: Set(code),
        remarks: Set(remarks),
        date_valid: Set(date_valid),
        is_used: Set(false),
        voucher_type_id: Set(voucher_type_id),
        ..Default::default()
    };

    model.insert(db).await.map_err(Into::into)
}

/// Generates a random 12-character voucher code (UUIDv4 suffix).
#[must_use]
pub fn generate_code() -> String {
    let uuid = Uuid::new_v4().to_string();
    uuid[uuid.len() - CODE_LENGTH..].to_string()
}

/// Finds a voucher by its code.
pub async fn get_voucher_by_code(
    db: &DatabaseConnection,
    code: &str,
) -> Result<Option<voucher::Model>> {
    Voucher::find()
        .filter(voucher::Column::Code.eq(code))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Checks a voucher against the validity rules without consuming it.
///
/// # Errors
/// `VoucherExpired` past the `date_valid` deadline, `VoucherAlreadyUsed`
/// when already consumed.
pub fn validate(voucher: &voucher::Model, at: DateTimeUtc) -> Result<()> {
    if voucher.date_valid < at {
        return Err(Error::VoucherExpired {
            code: voucher.code.clone(),
        });
    }
    if voucher.is_used {
        return Err(Error::VoucherAlreadyUsed {
            code: voucher.code.clone(),
        });
    }
    Ok(())
}

/// Consumes a voucher inside an existing transaction.
///
/// Runs `UPDATE vouchers SET is_used = true WHERE id = ? AND is_used = false`
/// in a single statement; a concurrent redeemer that already flipped the
/// flag leaves zero rows for us to update and we fail instead of
/// double-consuming.
pub async fn consume<C>(conn: &C, voucher: &voucher::Model) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = Voucher::update_many()
        .col_expr(voucher::Column::IsUsed, Expr::value(true))
        .filter(voucher::Column::Id.eq(voucher.id))
        .filter(voucher::Column::IsUsed.eq(false))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::VoucherAlreadyUsed {
            code: voucher.code.clone(),
        });
    }
    Ok(())
}

/// Redeems a voucher by code.
///
/// Fails with `VoucherNotFound`, `VoucherExpired` or `VoucherAlreadyUsed`;
/// on success the voucher is consumed irreversibly and the updated model is
/// returned.
pub async fn redeem(db: &DatabaseConnection, code: &str) -> Result<voucher::Model> {
    let voucher = get_voucher_by_code(db, code)
        .await?
        .ok_or_else(|| Error::VoucherNotFound {
            code: code.to_string(),
        })?;

    validate(&voucher, Utc::now())?;
    consume(db, &voucher).await?;

    info!("Voucher '{}' redeemed.", voucher.code);
    Ok(voucher::Model {
        is_used: true,
        ..voucher
    })
}
