use skim_core::{check_arity, Cell, Clock, Env, Intern, SkimError};

use crate::bind;

pub(crate) fn register(env: &Env) {
    bind(env, "clock", Intern::OpClock);
    bind(env, "clock-tic!", Intern::OpClockTic);
    bind(env, "clock-toc", Intern::OpClockToc);
    bind(env, "clock-pause!", Intern::OpClockPause);
    bind(env, "clock-resume!", Intern::OpClockResume);
}

fn clock_of(cell: &Cell) -> Result<std::rc::Rc<std::cell::RefCell<Clock>>, SkimError> {
    match cell {
        Cell::Clock(c) => Ok(c.clone()),
        other => Err(SkimError::type_error("clock", other.type_name())),
    }
}

pub(crate) fn call(op: Intern, args: &[Cell]) -> Result<Cell, SkimError> {
    use Intern::*;
    match op {
        OpClock => {
            check_arity!(args, "clock", 0);
            Ok(Cell::clock(Clock::new()))
        }
        OpClockTic => {
            check_arity!(args, "clock-tic!", 1);
            clock_of(&args[0])?.borrow_mut().tic();
            Ok(Cell::None)
        }
        OpClockToc => {
            check_arity!(args, "clock-toc", 1);
            let secs = clock_of(&args[0])?.borrow().toc();
            Ok(Cell::real(secs))
        }
        OpClockPause => {
            check_arity!(args, "clock-pause!", 1);
            clock_of(&args[0])?.borrow_mut().pause();
            Ok(Cell::None)
        }
        OpClockResume => {
            check_arity!(args, "clock-resume!", 1);
            clock_of(&args[0])?.borrow_mut().resume();
            Ok(Cell::None)
        }
        _ => Err(SkimError::eval("invalid primary operation")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toc_reads_seconds() {
        let c = call(Intern::OpClock, &[]).unwrap();
        call(Intern::OpClockPause, &[c.clone()]).unwrap();
        let a = call(Intern::OpClockToc, &[c.clone()]).unwrap();
        let b = call(Intern::OpClockToc, &[c]).unwrap();
        assert_eq!(a, b);
    }
}
