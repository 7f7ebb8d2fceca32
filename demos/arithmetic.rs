//! Sample harness: `cargo run --example arithmetic -- --verbose`

use std::process::ExitCode;

use suitecheck::check::{DeepEquals, Equals, ErrorMatches, HasLen, Panics};
use suitecheck::{assert_that, check, comment, thunk, CallContext, MethodSet, Registry, Suite};

#[derive(Default)]
struct Arithmetic {
    values: Vec<i64>,
}

impl Suite for Arithmetic {
    fn register(methods: &mut MethodSet<Self>) {
        methods
            .set_up_test(|s: &mut Self, _: &mut CallContext| {
                s.values = vec![1, 2, 3];
            })
            .test("test_sum", |s: &mut Self, c: &mut CallContext| {
                let sum: i64 = s.values.iter().sum();
                assert_that!(c, sum, Equals, 6i64, comment("sum of the seed values"))
            })
            .test("test_push", |s: &mut Self, c: &mut CallContext| {
                s.values.push(4);
                check!(c, s.values, HasLen, 4usize);
                check!(c, s.values, DeepEquals, vec![1i64, 2, 3, 4]);
            })
            .test("test_parse_error", |_: &mut Self, c: &mut CallContext| {
                let err: Box<dyn std::error::Error + Send + Sync> =
                    "x1".parse::<i64>().unwrap_err().into();
                check!(c, err, ErrorMatches, "invalid digit.*");
            })
            .test("test_division_by_zero", |_: &mut Self, c: &mut CallContext| {
                let divisor = std::hint::black_box(0i64);
                let divide = thunk(move || {
                    let _ = 1 / divisor;
                });
                check!(c, divide, Panics, "attempt to divide by zero");
            })
            .test("test_overflow", |_: &mut Self, c: &mut CallContext| {
                c.expect_failure("checked_add reports overflow as None");
                check!(c, i64::MAX.checked_add(1), Equals, Some(0i64));
            });
    }
}

fn main() -> ExitCode {
    suitecheck::cli::main(Registry::new().with(Arithmetic::default()))
}
