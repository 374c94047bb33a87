//! The packing engine: box-level placement, weight redistribution, box
//! selection, last-parcel downgrade, and diagnostics.
//!
//! The hot path is explicit and recursion-free: each parcel carries a FIFO
//! work-list of residual blocks, and placing an item pops the first block it
//! fits and pushes the block's `best_fit` residuals to the back of the list.

use std::collections::VecDeque;

use crate::geometry::{best_fit, fits, Block};
use crate::model::{BoxType, FitReport, Item, PackError, PackResult, Parcel, SpaceReport};
use crate::types::{Dims, EPSILON};

/// Default weight cap in grams (~70 lb), used when the caller supplies none.
pub const DEFAULT_MAX_WEIGHT_G: f64 = 31_710.0;

/// Tries to place `item` into a single `block`. Returns the residual blocks
/// left by `best_fit` on success, `None` if the item does not fit at all.
pub fn insert_into_block(item: Dims, block: Block) -> Option<Vec<Block>> {
    if !fits(item, block.as_dims()) {
        return None;
    }
    Some(best_fit(item, block.as_dims()))
}

/// Packs pre-sorted `items` into parcels of `box_dims`, opening a new parcel
/// whenever no existing parcel has a residual block left that fits.
///
/// Caller must ensure every item in `items` individually fits in `box_dims`;
/// violating this panics inside `best_fit`.
pub fn pack_box(items: &[Item], box_dims: Dims) -> Vec<Parcel> {
    let mut parcels: Vec<Parcel> = Vec::new();
    let mut queue: VecDeque<Block> = VecDeque::new();

    for item in items {
        let mut placed = false;
        let rounds = queue.len();
        for _ in 0..rounds {
            let block = queue.pop_front().expect("rounds bounds the queue length");
            if let Some(residuals) = insert_into_block(item.dims, block) {
                parcels
                    .last_mut()
                    .expect("a queue only exists once a parcel has been opened")
                    .items
                    .push(*item);
                queue.extend(residuals);
                placed = true;
                break;
            }
            queue.push_back(block);
        }

        if !placed {
            let mut parcel = Parcel::new();
            parcel.items.push(*item);
            parcels.push(parcel);
            queue.clear();
            queue.extend(best_fit(item.dims, box_dims));
        }
    }

    parcels
}

/// Splits each space-packed parcel into weight-capped sub-parcels.
///
/// Redistribution is tail-biased: while a parcel's weight exceeds
/// `max_weight`, its *last* item is popped off and funneled into a running
/// overflow parcel, regardless of that item's own weight. This can leave an
/// early parcel lighter than it could have been and a late one fuller — a
/// known shortcoming of the source algorithm, preserved here for
/// observable compatibility (see DESIGN.md).
pub fn redistribute_weight(
    parcels: Vec<Parcel>,
    box_type: &BoxType,
    max_weight: f64,
) -> Result<Vec<Parcel>, PackError> {
    let mut result = Vec::new();
    let mut overflow = Parcel::new();
    let mut overflow_weight = box_type.tare_weight;

    for mut parcel in parcels {
        while !parcel.items.is_empty() && parcel.total_weight() + box_type.tare_weight > max_weight + EPSILON {
            let item = parcel.items.pop().expect("checked non-empty above");

            if !overflow.is_empty() && overflow_weight + item.weight > max_weight + EPSILON {
                result.push(std::mem::take(&mut overflow));
                overflow_weight = box_type.tare_weight;
            }

            overflow.items.push(item);
            overflow_weight += item.weight;

            if overflow.items.len() == 1 && overflow_weight > max_weight + EPSILON {
                return Err(PackError::ItemTooHeavy);
            }
        }

        if !parcel.is_empty() {
            result.push(parcel);
        }
    }

    if !overflow.is_empty() {
        result.push(overflow);
    }

    Ok(result)
}

/// Chooses the candidate box requiring the fewest parcels, tie-breaking on
/// smaller box volume and then on the order boxes were supplied in.
///
/// `DoesNotFit` is returned if some item cannot fit in any candidate box at
/// all; `NoBoxesFit` if every item fits somewhere but no single box type fits
/// all of them.
pub fn select_box(
    items: &[Item],
    boxes: &[BoxType],
    max_weight: f64,
) -> Result<(BoxType, Vec<Parcel>), PackError> {
    for item in items {
        if !boxes.iter().any(|b| fits(item.dims, b.dims)) {
            return Err(PackError::DoesNotFit);
        }
    }

    let mut candidates: Vec<&BoxType> = boxes.iter().collect();
    candidates.sort_by(|a, b| a.volume().partial_cmp(&b.volume()).unwrap());

    let mut best: Option<(BoxType, Vec<Parcel>)> = None;

    for candidate in candidates {
        if !items.iter().all(|it| fits(it.dims, candidate.dims)) {
            continue;
        }

        let parcels = pack_box(items, candidate.dims);
        let parcels = redistribute_weight(parcels, candidate, max_weight)?;

        let is_better = match &best {
            None => true,
            Some((cur_box, cur_parcels)) => {
                parcels.len() < cur_parcels.len()
                    || (parcels.len() == cur_parcels.len() && candidate.volume() < cur_box.volume())
            }
        };

        if is_better {
            best = Some((candidate.clone(), parcels));
        }
    }

    best.ok_or(PackError::NoBoxesFit)
}

/// Attempts to re-pack the final parcel of the chosen box into a single,
/// strictly smaller box. Candidates are tried ascending by volume; the first
/// one that holds every item of the last parcel in one parcel, within the
/// weight cap, wins.
pub fn downgrade_last_parcel(
    last_parcel: &Parcel,
    chosen_box: &BoxType,
    boxes: &[BoxType],
    max_weight: f64,
) -> Option<BoxType> {
    let mut candidates: Vec<&BoxType> = boxes
        .iter()
        .filter(|b| b.volume() < chosen_box.volume() - EPSILON)
        .collect();
    candidates.sort_by(|a, b| a.volume().partial_cmp(&b.volume()).unwrap());

    for candidate in candidates {
        if !last_parcel.items.iter().all(|it| fits(it.dims, candidate.dims)) {
            continue;
        }

        let parcels = pack_box(&last_parcel.items, candidate.dims);
        if parcels.len() != 1 {
            continue;
        }

        let weight = candidate.tare_weight + parcels[0].total_weight();
        if weight <= max_weight + EPSILON {
            return Some(candidate.clone());
        }
    }

    None
}

/// Diagnostic: the residual voids and total residual volume left behind
/// after placing a single `item` in an otherwise-empty `box_dims`.
pub fn space_after_packing(item: Dims, box_dims: Dims) -> Result<SpaceReport, PackError> {
    if !fits(item, box_dims) {
        return Err(PackError::DoesNotFit);
    }
    let blocks = best_fit(item, box_dims);
    Ok(SpaceReport::from_blocks(&blocks))
}

/// Repeatedly places copies of the same `item` dims into an otherwise-empty
/// `box_dims`, counting how many fit before none do, capped at `cap` if
/// given. Returns `(total_packed, remaining_volume)`, where `remaining_volume`
/// is tracked arithmetically as `box volume − item volume × total_packed`
/// rather than by summing actual residual blocks.
pub fn pre_pack(item: Dims, box_dims: Dims, cap: Option<usize>) -> (usize, f64) {
    if !fits(item, box_dims) {
        return (0, box_dims.volume());
    }

    let mut blocks: VecDeque<Block> = VecDeque::new();
    blocks.push_back(Block::from_dims(box_dims));
    let mut count = 0usize;

    loop {
        if let Some(cap) = cap {
            if count >= cap {
                break;
            }
        }

        let mut placed = false;
        let rounds = blocks.len();
        for _ in 0..rounds {
            let block = blocks.pop_front().expect("rounds bounds the queue length");
            if let Some(residuals) = insert_into_block(item, block) {
                blocks.extend(residuals);
                placed = true;
                break;
            }
            blocks.push_back(block);
        }

        if !placed {
            break;
        }
        count += 1;
    }

    let remaining_volume = box_dims.volume() - item.volume() * count as f64;
    (count, remaining_volume)
}

/// Diagnostic: how many copies of `item` fit in `box_dims`, optionally capped.
pub fn how_many_fit(item: Dims, box_dims: Dims, cap: Option<usize>) -> FitReport {
    let (total_packed, remaining_volume) = pre_pack(item, box_dims, cap);
    FitReport {
        total_packed,
        remaining_volume,
    }
}

/// Packs `items` into the best candidate from `boxes`, honoring `max_weight`
/// (defaulting to [`DEFAULT_MAX_WEIGHT_G`] when `None`).
///
/// Items are placed first-fit-decreasing: sorted by descending longest
/// dimension before `select_box` ever sees them (stable, so input-order ties
/// are preserved), so the longest items claim space first.
pub fn pack(items: Vec<Item>, boxes: Vec<BoxType>, max_weight: Option<f64>) -> Result<PackResult, PackError> {
    if items.is_empty() || boxes.is_empty() {
        return Err(PackError::EmptyInput);
    }

    let mut seen_names = std::collections::HashSet::new();
    for b in &boxes {
        if !seen_names.insert(b.name.as_str()) {
            return Err(PackError::DuplicateBoxName(b.name.clone()));
        }
    }

    let max_weight = max_weight.unwrap_or(DEFAULT_MAX_WEIGHT_G);

    let mut sorted_items = items;
    sorted_items.sort_by(|a, b| b.dims.longest().partial_cmp(&a.dims.longest()).unwrap());

    let (chosen_box, parcels) = select_box(&sorted_items, &boxes, max_weight)?;

    let last_parcel = parcels
        .last()
        .and_then(|last| downgrade_last_parcel(last, &chosen_box, &boxes, max_weight));

    Ok(PackResult {
        chosen_box,
        parcels,
        last_parcel,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(a: f64, b: f64, c: f64) -> Dims {
        Dims::new(a, b, c).unwrap()
    }

    fn item(id: u64, a: f64, b: f64, c: f64, weight: f64) -> Item {
        Item::new(id, dims(a, b, c), weight).unwrap()
    }

    fn small_box() -> BoxType {
        BoxType::new("small", dims(10.0, 10.0, 10.0), 500.0).unwrap()
    }

    fn big_box() -> BoxType {
        BoxType::new("big", dims(20.0, 20.0, 20.0), 1000.0).unwrap()
    }

    #[test]
    fn single_item_packs_into_one_parcel() {
        let items = vec![item(1, 5.0, 5.0, 5.0, 1000.0)];
        let boxes = vec![small_box()];
        let result = pack(items, boxes, None).unwrap();
        assert_eq!(result.parcels.len(), 1);
        assert_eq!(result.parcels[0].items.len(), 1);
    }

    #[test]
    fn conservation_every_item_appears_exactly_once() {
        let items = vec![
            item(1, 3.0, 3.0, 3.0, 100.0),
            item(2, 4.0, 4.0, 4.0, 100.0),
            item(3, 2.0, 2.0, 2.0, 100.0),
        ];
        let boxes = vec![big_box()];
        let result = pack(items, boxes, None).unwrap();
        let mut ids: Vec<u64> = result
            .parcels
            .iter()
            .flat_map(|p| p.items.iter().map(|i| i.id))
            .collect();
        ids.sort();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn every_parcel_item_fits_the_chosen_box() {
        let items = vec![item(1, 5.0, 5.0, 5.0, 100.0), item(2, 6.0, 6.0, 6.0, 100.0)];
        let boxes = vec![small_box(), big_box()];
        let result = pack(items, boxes, None).unwrap();
        for parcel in &result.parcels {
            for it in &parcel.items {
                assert!(fits(it.dims, result.chosen_box.dims));
            }
        }
    }

    #[test]
    fn no_parcel_exceeds_max_weight() {
        let items = vec![
            item(1, 2.0, 2.0, 2.0, 900.0),
            item(2, 2.0, 2.0, 2.0, 900.0),
            item(3, 2.0, 2.0, 2.0, 900.0),
        ];
        let boxes = vec![big_box()];
        let result = pack(items, boxes, Some(1500.0)).unwrap();
        for parcel in &result.parcels {
            assert!(parcel.total_weight() + result.chosen_box.tare_weight <= 1500.0 + EPSILON);
        }
    }

    #[test]
    fn item_heavier_than_cap_errors() {
        let items = vec![item(1, 2.0, 2.0, 2.0, 5000.0)];
        let boxes = vec![big_box()];
        let err = pack(items, boxes, Some(1000.0)).unwrap_err();
        assert!(matches!(err, PackError::ItemTooHeavy));
    }

    #[test]
    fn item_too_large_for_any_box_errors() {
        let items = vec![item(1, 50.0, 50.0, 50.0, 100.0)];
        let boxes = vec![small_box(), big_box()];
        let err = pack(items, boxes, None).unwrap_err();
        assert!(matches!(err, PackError::DoesNotFit));
    }

    #[test]
    fn empty_items_or_boxes_errors() {
        assert!(matches!(
            pack(vec![], vec![small_box()], None).unwrap_err(),
            PackError::EmptyInput
        ));
        assert!(matches!(
            pack(vec![item(1, 1.0, 1.0, 1.0, 1.0)], vec![], None).unwrap_err(),
            PackError::EmptyInput
        ));
    }

    #[test]
    fn duplicate_box_names_are_rejected() {
        let items = vec![item(1, 1.0, 1.0, 1.0, 1.0)];
        let boxes = vec![small_box(), small_box()];
        let err = pack(items, boxes, None).unwrap_err();
        assert!(matches!(err, PackError::DuplicateBoxName(_)));
    }

    #[test]
    fn fewer_parcels_wins_box_selection_tie_break() {
        // One item that fits both boxes but needs only one parcel either way;
        // the smaller-volume box should win on the volume tie-break.
        let items = vec![item(1, 5.0, 5.0, 5.0, 100.0)];
        let boxes = vec![big_box(), small_box()];
        let result = pack(items, boxes, None).unwrap();
        assert_eq!(result.chosen_box.name, "small");
    }

    #[test]
    fn space_after_packing_reports_nonzero_blocks_sorted_ascending() {
        let report = space_after_packing(dims(2.0, 2.0, 2.0), dims(10.0, 10.0, 10.0)).unwrap();
        assert!(!report.remaining_blocks.is_empty());
        assert!(report.remaining_volume > 0.0);
    }

    #[test]
    fn space_after_packing_rejects_item_that_does_not_fit() {
        let err = space_after_packing(dims(20.0, 20.0, 20.0), dims(10.0, 10.0, 10.0)).unwrap_err();
        assert!(matches!(err, PackError::DoesNotFit));
    }

    #[test]
    fn how_many_fit_counts_at_least_one_when_item_fits() {
        let report = how_many_fit(dims(5.0, 5.0, 5.0), dims(10.0, 10.0, 10.0), None);
        assert!(report.total_packed >= 1);
    }

    #[test]
    fn how_many_fit_respects_cap() {
        let report = how_many_fit(dims(1.0, 1.0, 1.0), dims(10.0, 10.0, 10.0), Some(3));
        assert!(report.total_packed <= 3);
    }

    #[test]
    fn how_many_fit_unit_cube_into_four_cubed_box_with_cap() {
        // S7: unit cube into [4,4,4] with cap = 8 -> {total_packed: 8, remaining_volume: 56}.
        let report = how_many_fit(dims(1.0, 1.0, 1.0), dims(4.0, 4.0, 4.0), Some(8));
        assert_eq!(report.total_packed, 8);
        assert!((report.remaining_volume - 56.0).abs() < EPSILON);
    }

    #[test]
    fn how_many_fit_reports_box_volume_when_item_never_fits() {
        let report = how_many_fit(dims(20.0, 20.0, 20.0), dims(4.0, 4.0, 4.0), None);
        assert_eq!(report.total_packed, 0);
        assert!((report.remaining_volume - 64.0).abs() < EPSILON);
    }

    #[test]
    fn weight_redistribution_pops_from_the_tail() {
        // S6: item [1,1,1] weight 3000 x4, box [2,2,1] tare 0, max_weight 8999
        // -> 2 parcels of 2 items each (weight 6000 each).
        let items = vec![
            item(1, 1.0, 1.0, 1.0, 3000.0),
            item(2, 1.0, 1.0, 1.0, 3000.0),
            item(3, 1.0, 1.0, 1.0, 3000.0),
            item(4, 1.0, 1.0, 1.0, 3000.0),
        ];
        let box_type = BoxType::new("flat", dims(1.0, 2.0, 2.0), 0.0).unwrap();
        let parcels = pack_box(&items, box_type.dims);
        let parcels = redistribute_weight(parcels, &box_type, 8999.0).unwrap();
        assert_eq!(parcels.len(), 2);
        for parcel in &parcels {
            assert_eq!(parcel.items.len(), 2);
            assert!((parcel.total_weight() - 6000.0).abs() < EPSILON);
        }
    }

    #[test]
    fn downgrade_last_parcel_prefers_smaller_box_when_it_still_fits() {
        let items = vec![item(1, 2.0, 2.0, 2.0, 10.0)];
        let chosen = big_box();
        let boxes = vec![small_box(), big_box()];
        let downgraded = downgrade_last_parcel(
            &Parcel {
                items: items.clone(),
            },
            &chosen,
            &boxes,
            DEFAULT_MAX_WEIGHT_G,
        );
        assert_eq!(downgraded.map(|b| b.name), Some("small".to_string()));
    }
}
