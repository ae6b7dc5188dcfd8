// marketplace/src/money.rs

//! Decimal money arithmetic for checkout.
//!
//! Amounts are `rust_decimal::Decimal` throughout. Rounding to cents happens
//! only when a figure is stored or shown, always half away from zero.
//!
//! Tax is computed once for the whole batch and then split across the lines
//! in proportion to their subtotals. The per-line shares are rounded to cents
//! with the largest-remainder method so they add back up to the batch tax
//! exactly.
//!
//! Every product and sum is checked; a figure outside `Decimal`'s range comes
//! back as `AmountOverflow` instead of panicking.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const CENT: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Largest value the order amount columns (`NUMERIC(12, 2)`) hold: 9999999999.99.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Tax rates are stored as `NUMERIC(6, 4)`.
pub const TAX_RATE_SCALE: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("amount is too large to compute")]
pub struct AmountOverflow;

/// Rounds to 2 decimal places, half away from zero, and always carries a
/// scale of 2 so `20` is stored and rendered as `20.00`.
pub fn round_money(amount: Decimal) -> Decimal {
  let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
  rounded.rescale(2);
  rounded
}

pub fn line_subtotal(unit_price: Decimal, quantity: u32) -> Result<Decimal, AmountOverflow> {
  unit_price.checked_mul(Decimal::from(quantity)).ok_or(AmountOverflow)
}

pub fn batch_tax(subtotal: Decimal, tax_rate: Decimal) -> Result<Decimal, AmountOverflow> {
  subtotal.checked_mul(tax_rate).map(round_money).ok_or(AmountOverflow)
}

pub fn checked_sum<I>(amounts: I) -> Result<Decimal, AmountOverflow>
where
  I: IntoIterator<Item = Decimal>,
{
  amounts
    .into_iter()
    .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(amount))
    .ok_or(AmountOverflow)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineInput {
  pub unit_price: Decimal,
  pub quantity: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineAmounts {
  pub subtotal: Decimal,
  pub tax: Decimal,
  pub total: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchTotals {
  pub subtotal: Decimal,
  pub tax: Decimal,
  pub total: Decimal,
}

impl BatchTotals {
  pub fn from_lines(lines: &[LineInput], tax_rate: Decimal) -> Result<Self, AmountOverflow> {
    let subtotals = lines
      .iter()
      .map(|l| line_subtotal(l.unit_price, l.quantity))
      .collect::<Result<Vec<_>, _>>()?;
    let subtotal = round_money(checked_sum(subtotals)?);
    let tax = batch_tax(subtotal, tax_rate)?;
    Ok(Self {
      subtotal,
      tax,
      total: subtotal.checked_add(tax).ok_or(AmountOverflow)?,
    })
  }
}

/// Splits `batch_tax` across `lines` by subtotal share.
///
/// Every line gets zero tax when the rate or the batch subtotal is not
/// positive. Otherwise each line's exact share is floored to the cent and the
/// leftover cents go one each to the lines with the largest remainders (ties:
/// larger subtotal first, then input order). `batch_tax` must not be negative.
pub fn apportion(
  lines: &[LineInput],
  batch_subtotal: Decimal,
  batch_tax: Decimal,
  tax_rate: Decimal,
) -> Result<Vec<LineAmounts>, AmountOverflow> {
  let subtotals = lines
    .iter()
    .map(|l| line_subtotal(l.unit_price, l.quantity).map(round_money))
    .collect::<Result<Vec<_>, _>>()?;

  let taxes = if tax_rate > Decimal::ZERO && batch_subtotal > Decimal::ZERO && batch_tax > Decimal::ZERO {
    split_by_share(&subtotals, batch_subtotal, round_money(batch_tax))?
  } else {
    vec![round_money(Decimal::ZERO); subtotals.len()]
  };

  subtotals
    .into_iter()
    .zip(taxes)
    .map(|(subtotal, tax)| {
      let total = subtotal.checked_add(tax).ok_or(AmountOverflow)?;
      Ok(LineAmounts { subtotal, tax, total })
    })
    .collect()
}

fn split_by_share(
  subtotals: &[Decimal],
  batch_subtotal: Decimal,
  batch_tax: Decimal,
) -> Result<Vec<Decimal>, AmountOverflow> {
  let exact = subtotals
    .iter()
    .map(|s| {
      s.checked_mul(batch_tax)
        .and_then(|scaled| scaled.checked_div(batch_subtotal))
        .ok_or(AmountOverflow)
    })
    .collect::<Result<Vec<_>, _>>()?;
  let mut shares: Vec<Decimal> = exact
    .iter()
    .map(|e| {
      let mut floored = e.round_dp_with_strategy(2, RoundingStrategy::ToNegativeInfinity);
      floored.rescale(2);
      floored
    })
    .collect();

  let assigned = checked_sum(shares.iter().copied())?;
  let leftover = ((batch_tax - assigned) / CENT).round();
  let mut leftover_cents = usize::try_from(leftover.mantissa()).unwrap_or(0);
  if leftover_cents == 0 || shares.is_empty() {
    return Ok(shares);
  }

  let mut order: Vec<usize> = (0..shares.len()).collect();
  order.sort_by(|&a, &b| {
    let rem_a = exact[a] - shares[a];
    let rem_b = exact[b] - shares[b];
    rem_b
      .cmp(&rem_a)
      .then_with(|| subtotals[b].cmp(&subtotals[a]))
      .then_with(|| a.cmp(&b))
  });

  for idx in order.iter().cycle() {
    if leftover_cents == 0 {
      break;
    }
    shares[*idx] += CENT;
    leftover_cents -= 1;
  }
  Ok(shares)
}

#[cfg(test)]
mod tests {
  use super::*;
  use proptest::prelude::*;
  use rust_decimal_macros::dec;

  fn line(price: Decimal, quantity: u32) -> LineInput {
    LineInput {
      unit_price: price,
      quantity,
    }
  }

  #[test]
  fn rounds_half_away_from_zero_to_two_places() {
    assert_eq!(round_money(dec!(1.445)), dec!(1.45));
    assert_eq!(round_money(dec!(1.444)), dec!(1.44));
    assert_eq!(round_money(dec!(20)).to_string(), "20.00");
  }

  #[test]
  fn max_amount_matches_the_column_limit() {
    assert_eq!(MAX_AMOUNT, dec!(9999999999.99));
  }

  #[test]
  fn single_line_takes_the_whole_batch_tax() {
    let lines = [line(dec!(10.00), 2)];
    let totals = BatchTotals::from_lines(&lines, dec!(0.0725)).unwrap();
    assert_eq!(totals.subtotal, dec!(20.00));
    assert_eq!(totals.tax, dec!(1.45));

    let amounts = apportion(&lines, totals.subtotal, totals.tax, dec!(0.0725)).unwrap();
    assert_eq!(amounts[0].subtotal, dec!(20.00));
    assert_eq!(amounts[0].tax, dec!(1.45));
    assert_eq!(amounts[0].total, dec!(21.45));
  }

  #[test]
  fn leftover_cent_goes_to_the_largest_remainder() {
    // 0.10 of tax over three equal lines: 0.033.. each, one line gets the extra cent.
    let lines = [line(dec!(1.00), 1), line(dec!(1.00), 1), line(dec!(1.00), 1)];
    let amounts = apportion(&lines, dec!(3.00), dec!(0.10), dec!(0.0333)).unwrap();
    let taxes: Vec<Decimal> = amounts.iter().map(|a| a.tax).collect();
    assert_eq!(taxes, vec![dec!(0.04), dec!(0.03), dec!(0.03)]);
  }

  #[test]
  fn zero_rate_or_zero_subtotal_means_no_tax() {
    let lines = [line(dec!(0.00), 3), line(dec!(0.00), 1)];
    for a in apportion(&lines, dec!(0.00), dec!(0.00), dec!(0.08)).unwrap() {
      assert_eq!(a.tax, Decimal::ZERO);
    }
    for a in apportion(&[line(dec!(5.00), 1)], dec!(5.00), dec!(0.40), Decimal::ZERO).unwrap() {
      assert_eq!(a.tax, Decimal::ZERO);
      assert_eq!(a.total, dec!(5.00));
    }
  }

  #[test]
  fn empty_input_yields_no_lines() {
    assert!(apportion(&[], Decimal::ZERO, Decimal::ZERO, dec!(0.05)).unwrap().is_empty());
  }

  #[test]
  fn overflowing_amounts_are_reported_not_panicked() {
    let huge = dec!(79228162514264337593543950.33);
    assert_eq!(line_subtotal(Decimal::MAX, 2), Err(AmountOverflow));
    // The subtotal still fits; adding its tax does not.
    assert_eq!(BatchTotals::from_lines(&[line(huge, 1000)], dec!(0.05)), Err(AmountOverflow));
    assert_eq!(
      BatchTotals::from_lines(&[line(Decimal::MAX, 1), line(Decimal::MAX, 1)], Decimal::ZERO),
      Err(AmountOverflow)
    );
    assert_eq!(apportion(&[line(Decimal::MAX, 3)], dec!(1), dec!(1), dec!(0.05)), Err(AmountOverflow));
    assert_eq!(checked_sum([Decimal::MAX, Decimal::ONE]), Err(AmountOverflow));
  }

  fn arb_line() -> impl Strategy<Value = LineInput> {
    (0i64..500_000, 1u32..50).prop_map(|(cents, qty)| line(Decimal::new(cents, 2), qty))
  }

  proptest! {
    #[test]
    fn apportionment_partitions_the_batch(
      lines in prop::collection::vec(arb_line(), 1..25),
      rate_bp in 0i64..9_999,
    ) {
      let rate = Decimal::new(rate_bp, 4);
      let totals = BatchTotals::from_lines(&lines, rate).unwrap();
      let amounts = apportion(&lines, totals.subtotal, totals.tax, rate).unwrap();

      let subtotal_sum: Decimal = amounts.iter().map(|a| a.subtotal).sum();
      let tax_sum: Decimal = amounts.iter().map(|a| a.tax).sum();
      prop_assert_eq!(subtotal_sum, totals.subtotal);
      prop_assert_eq!(tax_sum, totals.tax);
      for a in &amounts {
        prop_assert!(a.tax >= Decimal::ZERO);
        prop_assert_eq!(a.total, a.subtotal + a.tax);
      }
    }

    #[test]
    fn zero_subtotal_never_divides(qtys in prop::collection::vec(1u32..10, 1..10), rate_bp in 1i64..9_999) {
      let lines: Vec<LineInput> = qtys.into_iter().map(|q| line(Decimal::ZERO, q)).collect();
      let rate = Decimal::new(rate_bp, 4);
      let totals = BatchTotals::from_lines(&lines, rate).unwrap();
      for a in apportion(&lines, totals.subtotal, totals.tax, rate).unwrap() {
        prop_assert_eq!(a.tax, Decimal::ZERO);
      }
    }
  }
}
