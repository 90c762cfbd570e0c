//! Installment schedule engine.
//!
//! Two pure functions, one per schedule type. Inputs are exact decimals;
//! every emitted monetary value is rounded to cents when the row is built,
//! never earlier (the running balance keeps full precision).
//!
//! ROUNDING: banker's rounding (midpoint to even) to 2 places. See
//! `round_money`.

use crate::{
    error::{SimError, SimResult},
    types::{Installment, ScheduleKind, ScheduleResult},
};
use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};

pub const MONEY_SCALE: u32 = 2;

/// Round a monetary amount to cents, midpoint to even.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointNearestEven)
}

fn overflow(context: &'static str) -> SimError {
    SimError::Overflow { context }
}

fn validate(principal: Decimal, term_months: u32, monthly_rate: Decimal) -> SimResult<()> {
    if principal <= Decimal::ZERO {
        return Err(SimError::invalid("principal", format!("must be positive, got {principal}")));
    }
    if term_months == 0 {
        return Err(SimError::invalid("term_months", "must be at least 1"));
    }
    // The rate comes from the catalog, not the caller.
    if monthly_rate < Decimal::ZERO {
        return Err(SimError::CorruptValue {
            column: "monthly_rate",
            value:  monthly_rate.to_string(),
        });
    }
    Ok(())
}

/// Constant amortization (SAC): the principal share is fixed at `P / N`,
/// interest falls with the balance, so installments decline.
pub fn sac(principal: Decimal, term_months: u32, monthly_rate: Decimal) -> SimResult<Vec<Installment>> {
    validate(principal, term_months, monthly_rate)?;

    let amortization = principal / Decimal::from(term_months);
    let mut balance = principal;
    let mut rows = Vec::with_capacity(term_months as usize);

    for number in 1..=term_months {
        let interest = balance
            .checked_mul(monthly_rate)
            .ok_or_else(|| overflow("SAC interest"))?;
        let total = amortization
            .checked_add(interest)
            .ok_or_else(|| overflow("SAC installment"))?;
        rows.push(Installment {
            number,
            amortization: round_money(amortization),
            interest:     round_money(interest),
            total:        round_money(total),
        });
        balance -= amortization;
    }

    Ok(rows)
}

/// Constant installment (PRICE / French system). The level installment is
/// rounded once up front and reused for every period; the principal share
/// grows as interest shrinks.
pub fn price(principal: Decimal, term_months: u32, monthly_rate: Decimal) -> SimResult<Vec<Installment>> {
    validate(principal, term_months, monthly_rate)?;

    let installment = round_money(level_installment(principal, term_months, monthly_rate)?);
    let mut balance = principal;
    let mut rows = Vec::with_capacity(term_months as usize);

    for number in 1..=term_months {
        let interest = balance
            .checked_mul(monthly_rate)
            .ok_or_else(|| overflow("PRICE interest"))?;
        let amortization = installment
            .checked_sub(interest)
            .ok_or_else(|| overflow("PRICE amortization"))?;
        rows.push(Installment {
            number,
            amortization: round_money(amortization),
            interest:     round_money(interest),
            total:        installment,
        });
        balance = balance
            .checked_sub(amortization)
            .ok_or_else(|| overflow("PRICE balance"))?;
    }

    Ok(rows)
}

/// `P * r / (1 - (1 + r)^-N)`, or `P / N` when the rate is zero (the
/// closed form divides by zero there).
///
/// The discount factor `(1 + r)^-N` is raised from `1 / (1 + r)`, so long
/// terms shrink it toward zero instead of overflowing `(1 + r)^N`.
fn level_installment(principal: Decimal, term_months: u32, monthly_rate: Decimal) -> SimResult<Decimal> {
    if monthly_rate.is_zero() {
        return Ok(principal / Decimal::from(term_months));
    }
    let discount = Decimal::ONE
        .checked_add(monthly_rate)
        .and_then(|growth| Decimal::ONE.checked_div(growth))
        .and_then(|step| step.checked_powu(u64::from(term_months)))
        .ok_or_else(|| overflow("PRICE discount factor"))?;
    principal
        .checked_mul(monthly_rate)
        .and_then(|interest| interest.checked_div(Decimal::ONE - discount))
        .ok_or_else(|| overflow("PRICE level installment"))
}

/// Both schedules for one request, SAC first.
pub fn both_schedules(
    principal: Decimal,
    term_months: u32,
    monthly_rate: Decimal,
) -> SimResult<[ScheduleResult; 2]> {
    Ok([
        ScheduleResult::new(ScheduleKind::Sac, sac(principal, term_months, monthly_rate)?),
        ScheduleResult::new(ScheduleKind::Price, price(principal, term_months, monthly_rate)?),
    ])
}
