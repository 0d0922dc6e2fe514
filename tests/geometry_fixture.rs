// tests/geometry_fixture.rs
//
// End-to-end geometry checks on the reference setup: a periodic 65-cell
// 1D domain, interpolation order 1, level 0 split in two, and two refined
// patches on level 1.

use plasma_amr::{
    build_hierarchy, hierarchy_overlaps, level_ghost_boxes, particle_ghost_area_boxes, AmrError,
    Box1, HierarchyConfig, Overlap, PatchHierarchy,
};

fn reference_hierarchy() -> PatchHierarchy<1> {
    let json = r#"{
        "cells": [65],
        "origin": [0.0],
        "cell_width": [0.01],
        "interp_order": 1,
        "boundary": ["periodic"],
        "quantities": ["Bx", "By", "Bz", "Ex", "Ey", "Ez"],
        "populations": [{"name": "protons", "mass": 1.0}],
        "refinement_boxes": {
            "L0": {"B0": {"lower": [5], "upper": [29]},
                   "B1": {"lower": [32], "upper": [55]}}
        }
    }"#;
    build_hierarchy(&HierarchyConfig::from_json(json).unwrap()).unwrap()
}

fn overlaps_for<'a>(overlaps: &'a [Overlap<1>], qty: &str) -> Vec<&'a Overlap<1>> {
    overlaps.iter().filter(|o| o.quantity == qty).collect()
}

#[test]
fn level_zero_overlaps_match_the_reference_values() {
    let hier = reference_hierarchy();
    let t = hier.first_time().unwrap().to_string();
    let overlaps = hierarchy_overlaps(&hier, &t).unwrap();
    let l0 = &overlaps[&0];

    // dual quantity: one direct overlap in the middle, two periodic images
    let by = overlaps_for(l0, "By");
    assert_eq!(by.len(), 3);
    assert_eq!(by[0].region, Box1::span(28, 37));
    assert_eq!(by[0].offset, ([0], [0]));
    assert_eq!(by[1].region, Box1::span(-5, 4));
    assert_eq!(by[1].offset, ([0], [-65]));
    assert_eq!(by[2].region, Box1::span(60, 69));
    assert_eq!(by[2].offset, ([65], [0]));

    // primal quantity: regions extend one node further up
    let bx = overlaps_for(l0, "Bx");
    assert_eq!(bx.len(), 3);
    assert_eq!(bx[0].region, Box1::span(28, 38));
    assert_eq!(bx[1].region, Box1::span(-5, 5));
    assert_eq!(bx[2].region, Box1::span(60, 70));

    // particles use their own, much narrower ghost width
    let protons = overlaps_for(l0, "protons");
    assert_eq!(protons.len(), 3);
    assert_eq!(protons[0].region, Box1::span(32, 33));
    assert_eq!(protons[1].region, Box1::span(-1, 0));
    assert_eq!(protons[1].offset, ([0], [-65]));
    assert_eq!(protons[2].region, Box1::span(64, 65));
    assert_eq!(protons[2].offset, ([65], [0]));
}

#[test]
fn periodic_overlaps_come_in_mirrored_pairs() {
    let hier = reference_hierarchy();
    let t = hier.first_time().unwrap().to_string();
    let overlaps = hierarchy_overlaps(&hier, &t).unwrap();

    for level_overlaps in overlaps.values() {
        for o in level_overlaps {
            let (off1, off2) = o.offset;
            if off1 == [0] && off2 == [0] {
                continue;
            }
            // the same wrap restated in the other patch's frame: a downward
            // shift of one side matches an upward shift of the other
            let mirrored = level_overlaps.iter().any(|m| {
                m.quantity == o.quantity
                    && m.patches == o.patches
                    && m.offset == ([-off2[0]], [-off1[0]])
                    && m.region == o.region.shift([-off1[0] - off2[0]])
            });
            assert!(mirrored, "no mirror for {:?}", o);
        }
    }
}

#[test]
fn level_one_overlaps_have_no_periodic_images() {
    let hier = reference_hierarchy();
    let t = hier.first_time().unwrap().to_string();
    let overlaps = hierarchy_overlaps(&hier, &t).unwrap();
    let l1 = &overlaps[&1];

    let by = overlaps_for(l1, "By");
    assert_eq!(by.len(), 1);
    assert_eq!(by[0].region, Box1::span(59, 64));
    assert_eq!(by[0].offset, ([0], [0]));

    let bx = overlaps_for(l1, "Bx");
    assert_eq!(bx.len(), 1);
    assert_eq!(bx[0].region, Box1::span(59, 65));
}

#[test]
fn particle_ghost_areas_surround_each_patch() {
    let hier = reference_hierarchy();
    let t = hier.first_time().unwrap().to_string();
    let areas = particle_ghost_area_boxes(&hier, &t).unwrap();

    let l0 = &areas[&0];
    assert_eq!(l0.len(), 2);
    assert_eq!(l0[0].boxes, vec![Box1::span(-1, -1), Box1::span(33, 33)]);
    assert_eq!(l0[1].boxes, vec![Box1::span(32, 32), Box1::span(65, 65)]);

    let l1 = &areas[&1];
    assert_eq!(l1[0].boxes, vec![Box1::span(9, 9), Box1::span(60, 60)]);
    assert_eq!(l1[1].boxes, vec![Box1::span(63, 63), Box1::span(112, 112)]);
}

#[test]
fn level_ghost_boxes_avoid_every_sibling_interior() {
    let hier = reference_hierarchy();
    let t = hier.first_time().unwrap().to_string();

    let per_qty = level_ghost_boxes(&hier, &["protons"], 1, &t).unwrap();
    assert_eq!(per_qty.len(), 1);
    let patches = &per_qty[0].patches;
    assert_eq!(patches[0].boxes, vec![Box1::span(9, 9), Box1::span(60, 60)]);
    assert_eq!(
        patches[1].boxes,
        vec![Box1::span(63, 63), Box1::span(112, 112)]
    );

    let level1 = hier.level(1, &t).unwrap();
    for qty in ["protons", "Bx", "By", "Ex"] {
        for per_patch in &level_ghost_boxes(&hier, &[qty], 1, &t).unwrap()[0].patches {
            for b in &per_patch.boxes {
                for patch in &level1.patches {
                    assert_eq!(b.intersection(&patch.cell_box), None);
                }
            }
        }
    }
}

#[test]
fn level_ghost_boxes_reject_the_coarsest_level() {
    let hier = reference_hierarchy();
    let t = hier.first_time().unwrap().to_string();
    assert!(matches!(
        level_ghost_boxes(&hier, &["By"], 0, &t),
        Err(AmrError::CoarsestLevelGhosts)
    ));
}

#[test]
fn unknown_time_is_rejected_not_defaulted() {
    let hier = reference_hierarchy();
    assert!(matches!(
        hierarchy_overlaps(&hier, "9.0000000000"),
        Err(AmrError::MissingTime(_))
    ));
}
