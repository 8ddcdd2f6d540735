use skim::{Cell, Interpreter, SkimError};

fn eval(input: &str) -> Cell {
    let interp = Interpreter::new();
    interp
        .eval_str(input)
        .unwrap_or_else(|e| panic!("failed to eval {input}: {e}"))
}

fn eval_to_string(input: &str) -> String {
    eval(input).to_string()
}

fn eval_err(input: &str) -> SkimError {
    let interp = Interpreter::new();
    interp
        .eval_str(input)
        .expect_err(&format!("expected error from {input}"))
}

#[test]
fn test_arithmetic_identities() {
    assert_eq!(eval("(+ 1 2 3)"), Cell::int(6));
    assert_eq!(eval("(+)"), Cell::int(0));
    assert_eq!(eval("(*)"), Cell::int(1));
    assert_eq!(eval("(- 5)"), Cell::int(-5));
    assert_eq!(eval("(/ 10 2 2)"), Cell::real(2.5));
    assert_eq!(eval("(/ 10 2)"), Cell::int(5));
    assert_eq!(eval("(+ 1 2.0)"), Cell::real(3.0));
}

#[test]
fn test_factorial() {
    assert_eq!(
        eval("(define (fact n) (if (<= n 1) 1 (* n (fact (- n 1))))) (fact 10)"),
        Cell::int(3628800)
    );
}

#[test]
fn test_unit_imaginary_squares_to_minus_one() {
    let out = eval("(* +i +i)");
    assert_eq!(out, Cell::int(-1));
    assert_eq!(out.to_string(), "-1");
}

#[test]
fn test_complex_arithmetic() {
    assert_eq!(eval("(real-part 3+4i)"), Cell::real(3.0));
    assert_eq!(eval("(imag-part 3+4i)"), Cell::real(4.0));
    assert_eq!(eval("(magnitude 3+4i)"), Cell::real(5.0));
}

#[test]
fn test_exactness() {
    assert_eq!(eval("(exact 2.7)"), Cell::int(2));
    assert_eq!(eval("(exact -2.7)"), Cell::int(-2));
    assert_eq!(eval("(exact 3.0)"), Cell::int(3));
    assert_eq!(eval("(inexact 2)"), Cell::real(2.0));
    assert_eq!(eval("#e2.7"), Cell::int(2));
    assert_eq!(eval("#i2.5"), Cell::real(2.5));
}

#[test]
fn test_define_and_set() {
    assert_eq!(eval("(define x 1) (set! x 42) x"), Cell::int(42));
    match eval_err("(set! nope 1)") {
        SkimError::Unbound(name) => assert_eq!(name, "nope"),
        other => panic!("expected unbound error, got {other}"),
    }
    match eval_err("missing") {
        SkimError::Unbound(name) => assert_eq!(name, "missing"),
        other => panic!("expected unbound error, got {other}"),
    }
}

#[test]
fn test_lambda_parameter_shapes() {
    assert_eq!(eval("((lambda (x y) (+ x y)) 3 4)"), Cell::int(7));
    assert_eq!(eval_to_string("((lambda args args) 1 2 3)"), "(1 2 3)");
    assert_eq!(
        eval_to_string("(define (f a . rest) (cons a rest)) (f 1 2 3)"),
        "(1 2 3)"
    );
    assert!(matches!(
        eval_err("((lambda (x y) x) 1)"),
        SkimError::Arity { .. }
    ));
}

#[test]
fn test_closures_capture_their_environment() {
    assert_eq!(
        eval(
            "(define (make-counter)
               (define n 0)
               (lambda () (set! n (+ n 1)) n))
             (define c (make-counter))
             (c) (c) (c)"
        ),
        Cell::int(3)
    );
}

#[test]
fn test_tail_recursion_runs_in_bounded_stack() {
    assert_eq!(
        eval("(define (loop n) (if (zero? n) 'done (loop (- n 1)))) (loop 100000)"),
        Cell::symbol("done")
    );
}

#[test]
fn test_mutual_tail_recursion() {
    assert_eq!(
        eval(
            "(define (even-n? n) (if (zero? n) #t (odd-n? (- n 1))))
             (define (odd-n? n) (if (zero? n) #f (even-n? (- n 1))))
             (even-n? 100000)"
        ),
        Cell::Bool(true)
    );
}

#[test]
fn test_conditionals() {
    assert_eq!(eval("(if #f 'yes)"), Cell::None);
    assert_eq!(eval("(if 0 'yes 'no)"), Cell::symbol("yes"));
    assert_eq!(eval("(if '() 'yes 'no)"), Cell::symbol("yes"));
    assert_eq!(
        eval("(cond ((= 1 2) 'a) ((= 1 1) 'b) (else 'c))"),
        Cell::symbol("b")
    );
    assert_eq!(eval("(cond (#f 'a) (else 'c))"), Cell::symbol("c"));
    assert_eq!(eval("(cond (42))"), Cell::int(42));
    assert_eq!(
        eval("(cond ((assq 'b '((a 1) (b 2))) => cadr) (else 'nope))"),
        Cell::int(2)
    );
    assert_eq!(eval("(when (= 1 1) 'a 'b)"), Cell::symbol("b"));
    assert_eq!(eval("(when (= 1 2) 'a)"), Cell::None);
    assert_eq!(eval("(unless (= 1 2) 'a)"), Cell::symbol("a"));
}

#[test]
fn test_and_or_return_the_deciding_value() {
    assert_eq!(eval("(and)"), Cell::Bool(true));
    assert_eq!(eval("(or)"), Cell::Bool(false));
    assert_eq!(eval("(and 1 2)"), Cell::int(2));
    assert_eq!(eval("(or #f 5)"), Cell::int(5));
    // short circuit: the error is never reached
    assert_eq!(eval("(and #f (error \"boom\"))"), Cell::Bool(false));
    assert_eq!(eval("(or 1 (error \"boom\"))"), Cell::int(1));
}

#[test]
fn test_begin_sequences() {
    assert_eq!(eval("(begin 1 2 3)"), Cell::int(3));
}

#[test]
fn test_quoting() {
    assert_eq!(eval_to_string("'(1 2 3)"), "(1 2 3)");
    assert_eq!(eval_to_string("''x"), "(quote x)");
    assert_eq!(eval("(car '(a b))"), Cell::symbol("a"));
}

#[test]
fn test_quasiquote() {
    assert_eq!(eval_to_string("`(1 ,(+ 1 1) ,@(list 3 4))"), "(1 2 3 4)");
    assert_eq!(eval_to_string("`(a . ,(+ 1 1))"), "(a . 2)");
    assert_eq!(eval_to_string("`#(1 ,(+ 1 1))"), "#(1 2)");
    // nesting: the inner quasiquote shields its unquote
    assert_eq!(eval_to_string("`(a `(b ,(foo)))"), "(a (quasiquote (b (unquote (foo)))))");
}

#[test]
fn test_define_macro_swap() {
    assert_eq!(
        eval(
            "(define-macro (swap a b)
               (list 'begin
                 (list 'define 'tmp a)
                 (list 'set! a b)
                 (list 'set! b 'tmp)))
             (define x 1)
             (define y 2)
             (swap x y)
             (list x y)"
        )
        .to_string(),
        "(2 1)"
    );
}

#[test]
fn test_macro_receives_unevaluated_forms() {
    // the argument is a list form, not its value
    assert_eq!(
        eval_to_string(
            "(define-macro (show e) (list 'quote e))
             (show (+ 1 2))"
        ),
        "(+ 1 2)"
    );
    assert_eq!(
        eval("(define-macro (m a) a) (macro? m)"),
        Cell::Bool(true)
    );
}

#[test]
fn test_macro_expand() {
    assert_eq!(
        eval_to_string(
            "(define-macro (twice e) (list 'begin e e))
             (macro-expand '(twice (f)))"
        ),
        "(begin (f) (f))"
    );
}

#[test]
fn test_apply_spreads_the_final_list() {
    assert_eq!(eval("(apply + 1 2 (list 3 4))"), Cell::int(10));
    assert_eq!(eval("(apply car '((5)))"), Cell::int(5));
    assert_eq!(eval("(apply + '())"), Cell::int(0));
}

#[test]
fn test_map_and_for_each() {
    assert_eq!(
        eval_to_string("(map (lambda (x) (* x x)) '(1 2 3))"),
        "(1 4 9)"
    );
    assert_eq!(eval_to_string("(map + '(1 2) '(10 20))"), "(11 22)");
    assert_eq!(
        eval(
            "(define sum 0)
             (for-each (lambda (x) (set! sum (+ sum x))) '(1 2 3))
             sum"
        ),
        Cell::int(6)
    );
}

#[test]
fn test_eval_primitive() {
    assert_eq!(eval("(eval '(+ 1 2))"), Cell::int(3));
    assert_eq!(eval("(eval (list '+ 1 2))"), Cell::int(3));
}

#[test]
fn test_dotted_input_equals_proper_list() {
    assert_eq!(
        eval("(equal? '(1 . (2 . (3 . ()))) '(1 2 3))"),
        Cell::Bool(true)
    );
}

#[test]
fn test_list_operations() {
    assert_eq!(eval_to_string("(append '(1 2) '(3) '())"), "(1 2 3)");
    assert_eq!(eval_to_string("(reverse '(1 2 3))"), "(3 2 1)");
    assert_eq!(eval("(length '(a b c))"), Cell::int(3));
    assert_eq!(eval("(list-ref '(a b c) 2)"), Cell::symbol("c"));
    assert_eq!(eval_to_string("(member 2 '(1 2 3))"), "(2 3)");
    assert_eq!(eval("(pair? '())"), Cell::Bool(false));
    assert_eq!(eval("(null? '())"), Cell::Bool(true));
    assert_eq!(eval("(null? '(1))"), Cell::Bool(false));
}

#[test]
fn test_pair_mutation() {
    assert_eq!(
        eval_to_string("(define p (cons 1 2)) (set-car! p 9) p"),
        "(9 . 2)"
    );
}

#[test]
fn test_cyclic_list_prints_bounded() {
    let out = eval_to_string(
        "(define l (list 1 2))
         (set-cdr! (cdr l) l)
         l",
    );
    assert!(out.ends_with("...)"), "got {out}");
}

#[test]
fn test_number_write_read_roundtrip() {
    for src in ["42", "-7", "2.5", "1e300", "3+4i", "1.5-2.5i", "+i", "-i"] {
        let written = eval_to_string(src);
        let reparsed = eval_to_string(&written);
        assert_eq!(written, reparsed, "roundtrip failed for {src}");
    }
}

#[test]
fn test_list_write_read_roundtrip() {
    let interp = Interpreter::new();
    let written = interp.eval_str("'(1 (2.5 #t) #\\a \"s\" sym)").unwrap();
    let text = written.to_string();
    let reparsed = skim::read_str(&text).unwrap();
    assert!(skim::is_equal(&written, &reparsed));
    assert_eq!(
        written.list_length().unwrap(),
        reparsed.list_length().unwrap()
    );
}

#[test]
fn test_characters() {
    assert_eq!(eval("#\\λ"), Cell::Char('λ'));
    assert_eq!(eval("(char->integer #\\λ)"), Cell::int(0x3bb));
    assert_eq!(eval("#\\x41"), Cell::Char('A'));
    assert_eq!(eval("(char-upcase #\\a)"), Cell::Char('A'));
    assert_eq!(eval("(char<? #\\a #\\b)"), Cell::Bool(true));
}

#[test]
fn test_write_and_display_forms() {
    // write form keeps the named character and stored escapes
    assert_eq!(
        eval_to_string(
            "(define p (open-output-string))
             (write #\\newline p)
             (get-output-string p)"
        ),
        "\"#\\newline\""
    );
    // display form emits the raw line break
    let interp = Interpreter::new();
    let out = interp
        .eval_str(
            "(define p (open-output-string))
             (display #\\newline p)
             (get-output-string p)",
        )
        .unwrap();
    assert_eq!(*out.as_string().unwrap().borrow(), "\n");
}

#[test]
fn test_string_escape_storage() {
    // escapes stay two characters until display time
    assert_eq!(eval("(string-length \"a\\nb\")"), Cell::int(4));
    let interp = Interpreter::new();
    let out = interp
        .eval_str(
            "(define p (open-output-string))
             (display \"a\\nb\" p)
             (get-output-string p)",
        )
        .unwrap();
    assert_eq!(*out.as_string().unwrap().borrow(), "a\nb");
}

#[test]
fn test_strings() {
    assert_eq!(eval("(string-length (make-string 3 #\\x))"), Cell::int(3));
    assert_eq!(eval_to_string("(string-append \"foo\" \"bar\")"), "\"foobar\"");
    assert_eq!(eval_to_string("(substring \"hello\" 1 4)"), "\"ell\"");
    assert_eq!(eval("(string=? \"a\" \"a\")"), Cell::Bool(true));
    assert_eq!(eval("(string->number \"#e2.5\")"), Cell::int(2));
    assert_eq!(eval("(string->symbol \"abc\")"), Cell::symbol("abc"));
    assert!(matches!(
        eval_err("(string-ref \"abc\" 5)"),
        SkimError::Range { .. }
    ));
}

#[test]
fn test_vectors() {
    assert_eq!(eval_to_string("#(1 2 3)"), "#(1 2 3)");
    assert_eq!(eval("(vector-ref #(1 2 3) 1)"), Cell::int(2));
    assert_eq!(
        eval_to_string("(define v (make-vector 2 0)) (vector-set! v 0 'a) v"),
        "#(a 0)"
    );
    assert_eq!(eval_to_string("(vector->list #(1 2))"), "(1 2)");
    assert!(matches!(
        eval_err("(vector-ref #(1) 1)"),
        SkimError::Range { .. }
    ));
}

#[test]
fn test_dictionaries() {
    assert_eq!(
        eval(
            "(define d (make-dict))
             (dict-insert! d 'k 1)
             (dict-insert! d \"s\" 2)
             (dict-find d 'k)"
        ),
        Cell::int(1)
    );
    assert_eq!(eval("(define d (make-dict)) (dict-find d 'x 99)"), Cell::int(99));
}

#[test]
fn test_regex_literals() {
    assert_eq!(eval_to_string("(regex-search #re\"[0-9]+\" \"ab12cd\")"), "\"12\"");
    assert_eq!(
        eval("(regex-match (regex \"ab+\") \"ABBB\")"),
        Cell::Bool(true)
    );
}

#[test]
fn test_string_ports_roundtrip_datum() {
    assert_eq!(
        eval_to_string(
            "(define p (open-input-string \"(1 2) 3\"))
             (define first (read p))
             (define second (read p))
             (list first second)"
        ),
        "((1 2) 3)"
    );
    assert_eq!(
        eval("(define p (open-input-string \"\")) (eof-object? (read p))"),
        Cell::Bool(true)
    );
}

#[test]
fn test_equivalence_predicates() {
    assert_eq!(eval("(eq? 'a 'a)"), Cell::Bool(true));
    assert_eq!(eval("(eq? (list 1) (list 1))"), Cell::Bool(false));
    assert_eq!(eval("(equal? (list 1) (list 1))"), Cell::Bool(true));
    assert_eq!(eval("(define p (list 1)) (eq? p p)"), Cell::Bool(true));
}

#[test]
fn test_type_predicates() {
    assert_eq!(eval("(number? 1)"), Cell::Bool(true));
    assert_eq!(eval("(integer? 2.0)"), Cell::Bool(true));
    assert_eq!(eval("(symbol? 'x)"), Cell::Bool(true));
    assert_eq!(eval("(string? \"x\")"), Cell::Bool(true));
    assert_eq!(eval("(procedure? car)"), Cell::Bool(true));
    assert_eq!(eval("(procedure? (lambda (x) x))"), Cell::Bool(true));
    assert_eq!(eval("(odd? 3)"), Cell::Bool(true));
    assert_eq!(eval("(even? 3)"), Cell::Bool(false));
    assert_eq!(eval("(zero? 0)"), Cell::Bool(true));
    assert_eq!(eval("(negative? -1)"), Cell::Bool(true));
    assert_eq!(eval("(positive? 1)"), Cell::Bool(true));
}

#[test]
fn test_error_primitive() {
    let err = eval_err("(error \"bad input:\" 42)");
    assert!(err.to_string().contains("bad input: 42"));
}

#[test]
fn test_arity_and_type_errors() {
    assert!(matches!(eval_err("(car)"), SkimError::Arity { .. }));
    assert!(matches!(eval_err("(car 5)"), SkimError::Type { .. }));
    assert!(matches!(
        eval_err("(+ 1 \"x\")"),
        SkimError::Type { .. }
    ));
    assert!(matches!(
        eval_err("(/ 1 0)"),
        SkimError::Arithmetic(_)
    ));
}

#[test]
fn test_parse_errors() {
    assert!(matches!(eval_err("(1 2"), SkimError::Parse { .. }));
    assert!(matches!(eval_err(")"), SkimError::Parse { .. }));
    assert!(matches!(eval_err("\"open"), SkimError::Parse { .. }));
}

#[test]
fn test_define_returns_no_value() {
    let interp = Interpreter::new();
    let out = interp.eval_str("(define x 1)").unwrap();
    assert!(out.is_none());
}

#[test]
fn test_symbols_intern_once() {
    assert_eq!(eval("(eq? 'abc (string->symbol \"abc\"))"), Cell::Bool(true));
}

#[test]
fn test_host_functions() {
    let interp = Interpreter::new();
    skim::define_function(&interp.global_env, "triple", |args| {
        let n = args[0].as_number()?;
        Ok(Cell::Number(n.mul(&skim::Number::Int(3))))
    });
    assert_eq!(interp.eval_str("(triple 14)").unwrap(), Cell::int(42));
    assert_eq!(
        interp.eval_str("triple").unwrap().to_string(),
        "#<function triple>"
    );
}

#[test]
fn test_printed_representations() {
    assert_eq!(eval_to_string("(lambda (x) x)"), "#<clojure>");
    assert_eq!(
        eval_to_string("(define-macro (m a) a) m"),
        "#<macro>"
    );
    assert_eq!(eval_to_string("car"), "#<primop>");
    assert_eq!(eval_to_string("if"), "if");
    assert_eq!(eval_to_string("#re\"x\""), "#<regex>");
    assert_eq!(eval_to_string("(make-dict)"), "#<dict>");
    assert_eq!(
        eval_to_string("(string->symbol \"hello world\")"),
        "|hello world|"
    );
}
