use sql_dispatch::data::{
    BitN, DoubleN, NullableArray, TextN, field_at, field_at_mut,
};
use sql_dispatch::prelude::*;
use sql_dispatch::types::Bigint;

#[derive(Debug, Default, Clone, PartialEq)]
struct Player {
    id: Bigint,
    name: TextN,
    rating: DoubleN,
    active: BitN,
    code: [u8; 3],
    tag: NullableArray<u8, 2>,
}

sql_set!(Player {
    id: Bigint,
    name: TextN,
    rating: DoubleN,
    active: BitN,
    code: Char,
    tag: BinaryN,
});

#[test]
fn record_describes_its_fields_in_order() {
    let player = Player::default();
    assert_eq!(player.count(), 6);
    let kinds: Vec<Type> = (0..=player.count()).map(|i| player.type_of(i)).collect();
    assert_eq!(
        kinds,
        vec![
            Type::Bigint,
            Type::TextN,
            Type::DoubleN,
            Type::BitN,
            Type::Char,
            Type::BinaryN,
            Type::Nothing,
        ]
    );
    assert_eq!(player.size_of(0), 0);
    assert_eq!(player.size_of(4), 3);
    assert_eq!(player.size_of(5), 2);
    assert_eq!(player.size_of(6), 0);
    validate_set(&player).unwrap();
}

#[test]
fn fields_default_to_null() {
    let player = Player::default();
    assert!(player.name.is_null());
    assert!(player.rating.is_null());
    assert!(player.tag.is_null());
    assert!(player.field(1).unwrap().is_null());
    assert!(!player.field(0).unwrap().is_null());
    assert!(player.field(6).is_none());
}

#[test]
fn mutable_views_write_through_to_storage() {
    let mut player = Player::default();
    match field_at_mut(&mut player, 0).unwrap() {
        FieldMut::Bigint(id) => *id = 42,
        other => panic!("unexpected view {:?}", other.sql_type()),
    }
    match field_at_mut(&mut player, 1).unwrap() {
        FieldMut::TextN(name) => name.set("ada".to_string()),
        other => panic!("unexpected view {:?}", other.sql_type()),
    }
    match field_at_mut(&mut player, 5).unwrap() {
        FieldMut::BinaryN(bytes, null) => {
            bytes.copy_from_slice(&[7, 9]);
            *null = false;
        }
        other => panic!("unexpected view {:?}", other.sql_type()),
    }

    assert_eq!(player.id, 42);
    assert_eq!(player.name.get().map(String::as_str), Some("ada"));
    assert_eq!(player.tag.get(), Some(&[7, 9]));

    let mut view = field_at_mut(&mut player, 1).unwrap();
    assert!(view.set_null(true));
    drop(view);
    assert!(player.name.is_null());
}

#[test]
fn out_of_range_field_is_a_binding_error() {
    let player = Player::default();
    let err = field_at(&player, 6).unwrap_err();
    assert!(matches!(err, SqlDispatchError::BindingError(_)));
}

#[test]
fn nullable_tracks_its_flag_separately_from_storage() {
    let mut rating = DoubleN::new(1.5);
    assert_eq!(rating.get(), Some(&1.5));
    rating.set_null(true);
    assert_eq!(rating.get(), None);
    assert_eq!(*rating.storage(), 1.5);
    assert_eq!(rating.to_string(), "NULL");
    rating.set(2.0);
    assert_eq!(rating.to_string(), "2");
    assert_eq!(rating.into_option(), Some(2.0));

    let from_none: TextN = None.into();
    assert!(from_none.is_null());
}

#[test]
fn container_keeps_insertion_order_both_ways() {
    let mut players = SetContainer::<Player>::new();
    assert!(players.front().is_none());
    for id in 1..=3 {
        players.new_record().id = id;
    }
    {
        let erased: &mut dyn SetContainerPar = &mut players;
        assert_eq!(erased.len(), 3);
        let record = erased.append();
        assert_eq!(record.count(), 6);
        assert!(erased.remove_last());
    }

    let forward: Vec<Bigint> = players.iter().map(|p| p.id).collect();
    let backward: Vec<Bigint> = players.iter().rev().map(|p| p.id).collect();
    assert_eq!(forward, vec![1, 2, 3]);
    assert_eq!(backward, vec![3, 2, 1]);
    assert_eq!(players.front().map(|p| p.id), Some(1));
    assert_eq!(players.back().map(|p| p.id), Some(3));

    for player in &mut players {
        player.active.set(true);
    }
    assert!(players.iter().all(|p| p.active.get() == Some(&true)));
}

#[test]
fn parameters_round_trip_through_value_conversions() {
    let mut source = Player {
        id: 7,
        name: "grace".to_string().into(),
        code: *b"ab\0",
        ..Player::default()
    };
    source.rating.set(3.25);

    let mut hooks = ValueConversion::for_set(&source);
    bind_params(&source, &mut hooks).unwrap();
    let encoded = sql_dispatch::conversion::row_values(&hooks);
    assert_eq!(
        encoded,
        vec![
            RowValues::Int(7),
            RowValues::Text("grace".into()),
            RowValues::Float(3.25),
            RowValues::Null,
            RowValues::Text("ab".into()),
            RowValues::Null,
        ]
    );

    let mut target = Player::default();
    let mut hooks = ValueConversion::for_set(&target);
    sql_dispatch::conversion::load_row(&mut hooks, encoded).unwrap();
    fetch_row(&mut target, &mut hooks).unwrap();
    assert_eq!(target, source);
}
