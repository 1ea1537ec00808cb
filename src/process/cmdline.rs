/*!
 * Command Line Serialization
 *
 * Builds a single command-line string from an argument vector using the
 * MSVC runtime parsing rules, so the child's parser recovers every argument
 * exactly:
 * - arguments are separated by one space
 * - an empty argument, or one containing space or tab, is quoted
 * - an embedded `"` becomes `\"`, doubling the backslashes before it
 * - backslashes before a closing quote are doubled
 */

use std::iter;

/// Append one argument to `line`
pub fn append_arg(line: &mut String, arg: &str) {
    let quote = arg.is_empty() || arg.contains([' ', '\t']);
    if quote {
        line.push('"');
    }

    let mut backslashes = 0usize;
    for c in arg.chars() {
        if c == '\\' {
            backslashes += 1;
        } else {
            if c == '"' {
                line.extend(iter::repeat('\\').take(backslashes + 1));
            }
            backslashes = 0;
        }
        line.push(c);
    }

    if quote {
        line.extend(iter::repeat('\\').take(backslashes));
        line.push('"');
    }
}

/// Serialize arguments (without the program name)
pub fn serialize_args<S: AsRef<str>>(args: &[S]) -> String {
    let mut line = String::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            line.push(' ');
        }
        append_arg(&mut line, arg.as_ref());
    }
    line
}

/// Full command line: program name followed by the arguments
pub fn build_command_line<S: AsRef<str>>(program: &str, args: &[S]) -> String {
    let mut line = String::new();
    append_arg(&mut line, program);
    for arg in args {
        line.push(' ');
        append_arg(&mut line, arg.as_ref());
    }
    line
}
