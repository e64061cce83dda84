use crate::{Attribute, DataType, Field, TableSchema, Tuple};
use itertools::izip;
use rand::distributions::Alphanumeric;
use rand::{
    distributions::{Distribution, Uniform},
    thread_rng, Rng,
};

pub fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn gen_uniform_strings(n: u64, cardinality: Option<u64>, min: usize, max: usize) -> Vec<Field> {
    let mut rng = rand::thread_rng();
    let mut ret: Vec<Field> = Vec::new();
    if let Some(card) = cardinality {
        let values: Vec<Field> = (0..card)
            .map(|_| Field::StringField(gen_rand_string_range(min, max)))
            .collect();
        assert_eq!(card as usize, values.len());
        let uniform = Uniform::new(0, values.len());
        for _ in 0..n {
            let idx = uniform.sample(&mut rng);
            assert!(idx < card as usize);
            ret.push(values[idx].clone())
        }
    } else {
        for _ in 0..n {
            ret.push(Field::StringField(gen_rand_string_range(min, max)))
        }
    }
    ret
}

pub fn gen_uniform_ints(n: u64, cardinality: Option<u64>) -> Vec<Field> {
    let mut rng = rand::thread_rng();
    let mut ret = Vec::new();
    if let Some(card) = cardinality {
        if card > i32::MAX as u64 {
            panic!("Cardinality larger than i32 max")
        }
        if n == card {
            // all values distinct
            if n < i32::MAX as u64 / 2 {
                for i in 0..card as i32 {
                    ret.push(Field::IntField(i));
                }
            } else {
                for i in i32::MIN..i32::MIN + (card as i32) {
                    ret.push(Field::IntField(i));
                }
            }
        } else {
            let mut range = Uniform::new_inclusive(i32::MIN, i32::MIN + (card as i32) - 1);
            if card < (i32::MAX / 2) as u64 {
                range = Uniform::new_inclusive(0, card as i32 - 1);
            }
            for _ in 0..n {
                ret.push(Field::IntField(range.sample(&mut rng) as i32));
            }
        }
    } else {
        for _ in 0..n {
            ret.push(Field::IntField(rng.gen::<i32>()));
        }
    }
    ret
}

/// Generates tuples of the schema (id, 4 int attributes, 4 string attributes)
/// with increasing value cardinality per attribute.
pub fn gen_test_tuples(n: u64) -> Vec<Tuple> {
    let keys = gen_uniform_ints(n, Some(n));
    let i1 = gen_uniform_ints(n, Some(10));
    let i2 = gen_uniform_ints(n, Some(100));
    let i3 = gen_uniform_ints(n, Some(1000));
    let i4 = gen_uniform_ints(n, Some(10000));
    let s1 = gen_uniform_strings(n, Some(10), 10, 20);
    let s2 = gen_uniform_strings(n, Some(100), 10, 20);
    let s3 = gen_uniform_strings(n, Some(1000), 10, 20);
    let s4 = gen_uniform_strings(n, Some(10000), 10, 30);
    let mut tuples = Vec::new();
    for (k, a, b, c, d, e, f, g, h) in izip!(keys, i1, i2, i3, i4, s1, s2, s3, s4) {
        let vals: Vec<Field> = vec![k, a, b, c, d, e, f, g, h];
        tuples.push(Tuple::new(vals));
    }
    tuples
}

/// Schema matching the tuples from gen_test_tuples.
pub fn gen_test_schema() -> TableSchema {
    let mut attrs = vec![Attribute::new(String::from("id"), DataType::Int)];
    for n in 1..5 {
        attrs.push(Attribute::new(format!("ia{}", n), DataType::Int));
    }
    for n in 1..5 {
        attrs.push(Attribute::new(format!("sa{}", n), DataType::String));
    }
    TableSchema::new(attrs)
}

/// Converts an int vector to a Tuple.
///
/// # Argument
///
/// * `data` - Data to put into tuple.
pub fn int_vec_to_tuple(data: Vec<i32>) -> Tuple {
    let mut tuple_data = Vec::new();

    for val in data {
        tuple_data.push(Field::IntField(val));
    }

    Tuple::new(tuple_data)
}

/// Creates a Vec of tuples containing IntFields given a 2D Vec of i32 's
pub fn create_tuple_list(tuple_data: Vec<Vec<i32>>) -> Vec<Tuple> {
    let mut tuples = Vec::new();
    for item in &tuple_data {
        let fields = item.iter().map(|i| Field::IntField(*i)).collect();
        tuples.push(Tuple::new(fields));
    }
    tuples
}

/// Creates a new table schema for a table with width number of IntFields.
pub fn get_int_table_schema(width: usize) -> TableSchema {
    let mut attrs = Vec::new();
    for _ in 0..width {
        attrs.push(Attribute::new(String::new(), DataType::Int))
    }
    TableSchema::new(attrs)
}

pub fn gen_rand_string_range(min: usize, max: usize) -> String {
    if min >= max {
        return gen_rand_string(min);
    }
    let mut rng = rand::thread_rng();
    let size = rng.gen_range(min..max);
    thread_rng()
        .sample_iter(Alphanumeric)
        .take(size)
        .map(char::from)
        .collect()
}

pub fn gen_rand_string(n: usize) -> String {
    thread_rng()
        .sample_iter(Alphanumeric)
        .take(n)
        .map(char::from)
        .collect()
}
