use room_forge_core::{
    Cell, ConfigurationError, DoorDirection, EngagementMetrics, GeneratorConfig, Grid,
    InMemoryArchive, Position, RoomData, RoomError, RoomGenerator, TileArchetype, TilePalette,
    boundary::DoorPositions, generate_room, generator::GenerationStage, pathfinding,
};

const WIDTHS: [usize; 6] = [3, 4, 5, 8, 17, 31];
const HEIGHTS: [usize; 4] = [3, 4, 9, 12];

fn engagement_samples() -> Vec<EngagementMetrics> {
    vec![
        EngagementMetrics::zero(),
        EngagementMetrics::new(10.0, 3.0, 2.0),
        EngagementMetrics::new(0.0, 40.0, 0.0),
        EngagementMetrics::new(1.0, 0.0, 25.0),
    ]
}

fn for_each_room(mut check: impl FnMut(&RoomData, &EngagementMetrics)) {
    for width in WIDTHS {
        for height in HEIGHTS {
            for previous in engagement_samples() {
                for seed in 0..3 {
                    let room = generate_room(width, height, &previous, seed).unwrap();
                    check(&room, &previous);
                }
            }
        }
    }
}

fn is_floor(cell: &Cell) -> bool {
    matches!(cell, Cell::Floor { .. })
}

#[test]
fn doors_sit_at_side_midpoints() {
    for_each_room(|room, _| {
        let grid = room.grid();
        let expected = DoorPositions::for_size(room.width(), room.height());
        let doors: Vec<(Position, DoorDirection)> = grid
            .enumerate()
            .filter_map(|((x, y), cell)| match cell {
                Cell::Door { direction, .. } => Some((Position::new(x, y), *direction)),
                _ => None,
            })
            .collect();
        assert_eq!(doors.len(), 4);
        for (position, direction) in doors {
            assert_eq!(expected.get(direction), position);
        }
        assert_eq!(room.doors(), &expected);
    });
}

#[test]
fn perimeter_is_walls_and_doors() {
    for_each_room(|room, _| {
        for ((x, y), cell) in room.grid().enumerate() {
            let position = Position::new(x, y);
            if room.grid().is_perimeter(position) {
                assert!(
                    matches!(cell, Cell::Wall(_) | Cell::Door { .. }),
                    "{:?} at {:?}",
                    cell,
                    position
                );
            } else {
                assert!(!matches!(cell, Cell::Wall(_) | Cell::Door { .. }));
            }
        }
    });
}

#[test]
fn every_door_pair_is_connected_over_floor() {
    for_each_room(|room, _| {
        assert!(room.unreachable().is_empty());
        let doors: Vec<Position> = room.doors().iter().map(|(_, p)| p).collect();
        for (i, from) in doors.iter().enumerate() {
            for to in &doors[i + 1..] {
                let path = pathfinding::find_path(room.grid(), *from, *to, is_floor);
                assert!(
                    path.is_some(),
                    "{}x{}: no floor path from {:?} to {:?}",
                    room.width(),
                    room.height(),
                    from,
                    to
                );
            }
        }
    });
}

#[test]
fn guaranteed_floor_is_interior_floor() {
    for_each_room(|room, _| {
        assert!(!room.guaranteed_floor().is_empty());
        for position in room.guaranteed_floor() {
            assert!(room.grid().is_interior(*position));
            assert!(is_floor(&room.grid()[*position]));
        }
    });
}

#[test]
fn zero_engagement_leaves_no_optional_floor() {
    for_each_room(|room, previous| {
        if previous.score() != 0.0 {
            return;
        }
        for ((x, y), cell) in room.grid().enumerate() {
            let position = Position::new(x, y);
            if room.grid().is_interior(position) && !room.guaranteed_floor().contains(&position) {
                assert!(matches!(cell, Cell::Pit | Cell::Item { .. }));
            }
        }
    });
}

#[test]
fn interior_holds_only_floor_pits_and_items() {
    for_each_room(|room, _| {
        for ((x, y), cell) in room.grid().enumerate() {
            if room.grid().is_interior(Position::new(x, y)) {
                assert!(matches!(
                    cell,
                    Cell::Floor { explored: false } | Cell::Pit | Cell::Item { value: 1, .. }
                ));
            }
        }
    });
}

#[test]
fn generation_is_deterministic_per_seed() {
    for previous in engagement_samples() {
        let a = generate_room(17, 9, &previous, 1234).unwrap();
        let b = generate_room(17, 9, &previous, 1234).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.stage(), GenerationStage::ContentFilled);
    }
}

#[test]
fn default_room_matches_reference_layout() {
    let room = generate_room(17, 9, &EngagementMetrics::zero(), 0).unwrap();
    let grid = room.grid();
    assert_eq!((grid.width(), grid.height()), (17, 9));
    assert_eq!(
        grid[Position::new(8, 0)],
        Cell::Door {
            direction: DoorDirection::Bottom,
            open: true
        }
    );
    assert!(grid[Position::new(8, 8)].is_door());
    assert!(grid[Position::new(0, 4)].is_door());
    assert!(grid[Position::new(16, 4)].is_door());
    // The straight left-right corridor is the shortest path between those doors.
    for x in 1..16 {
        assert!(room.guaranteed_floor().contains(&Position::new(x, 4)));
    }
}

#[test]
fn rendering_resolves_every_cell() {
    let palette = TilePalette::from_fn(|archetype| archetype);
    let mut generator =
        RoomGenerator::new(GeneratorConfig::default(), palette, InMemoryArchive::new()).unwrap();
    let rendered = generator
        .generate(&EngagementMetrics::new(3.0, 3.0, 3.0), 17)
        .unwrap();
    assert_eq!(rendered.room.stage(), GenerationStage::Rendered);
    for ((x, y), cell) in rendered.room.grid().enumerate() {
        assert_eq!(rendered.tiles[Position::new(x, y)], cell.archetype());
    }
}

#[test]
fn missing_tile_aborts_and_keeps_previous_room() {
    let mut palette: TilePalette<char> = TilePalette::from_fn(|_| '#');
    palette.remove(TileArchetype::Pit);
    let mut generator =
        RoomGenerator::new(GeneratorConfig::default(), palette, InMemoryArchive::new()).unwrap();

    let err = generator
        .generate(&EngagementMetrics::zero(), 0)
        .unwrap_err();
    assert_eq!(
        err,
        RoomError::Configuration(ConfigurationError::MissingTile(TileArchetype::Pit))
    );
    assert!(generator.current().is_none());

    generator.palette_mut().insert(TileArchetype::Pit, '~');
    generator.generate(&EngagementMetrics::zero(), 0).unwrap();
    let kept: Grid<Cell> = generator.current().unwrap().room.grid().clone();

    generator.palette_mut().remove(TileArchetype::Floor);
    assert!(generator.generate(&EngagementMetrics::zero(), 1).is_err());
    assert_eq!(generator.current().unwrap().room.grid(), &kept);
}

#[test]
fn invalid_sizes_are_configuration_errors() {
    for (width, height) in [(0, 0), (2, 9), (17, 2), (101, 9)] {
        assert!(matches!(
            generate_room(width, height, &EngagementMetrics::zero(), 0),
            Err(RoomError::Configuration(ConfigurationError::RoomSize { .. }))
        ));
    }
}
